use std::borrow::Cow;

use serde_json::Value;

use crate::{Error, Globals, Result};

/// Structured event data handed to drivers: a JSON object.
pub type Payload = serde_json::Map<String, Value>;

/// Name prefix reserved for [`CustomEvent`](crate::events::CustomEvent)s.
pub const CUSTOM_PREFIX: &str = "custom.";

/// A behavioral event routed to tracking drivers.
///
/// Events must be `Send + Sync + 'static` because a single queued event is
/// shared (behind an `Arc`) by every driver that tracks it, each on its own
/// task.
///
/// The orchestrator treats an event as read-only, with one exception:
/// [`set_globals`](Event::set_globals) is called exactly once, before the event
/// is queued, so the event can fill its unset fields from the process-wide
/// [`Globals`].
///
/// Most applications use the typed events in [`crate::events`] or the
/// generic [`TrackEvent`]. With the `macros` feature, `#[derive(Event)]`
/// implements this trait for any `Serialize` struct.
pub trait Event: Send + Sync + std::fmt::Debug + 'static {
    /// Routing name, e.g. `"purchase"`. Stable for the event's lifetime.
    fn name(&self) -> Cow<'static, str>;

    /// Optional human-readable label.
    fn label(&self) -> Option<&str> {
        None
    }

    /// Payload as seen by drivers.
    fn data(&self) -> Payload;

    /// Fills unset fields from `globals`. Never overwrites a value already set.
    fn set_globals(&mut self, globals: &Globals) {
        let _globals = globals;
    }

    /// Driver-specific payload of a custom event, `None` when the event has
    /// nothing for `driver`.
    fn for_driver(&self, driver: &str) -> Option<Payload> {
        let _driver = driver;
        None
    }

    fn is_custom(&self) -> bool {
        self.name().starts_with(CUSTOM_PREFIX)
    }
}

impl<E: Event + ?Sized> Event for Box<E> {
    fn name(&self) -> Cow<'static, str> {
        (**self).name()
    }

    fn label(&self) -> Option<&str> {
        (**self).label()
    }

    fn data(&self) -> Payload {
        (**self).data()
    }

    fn set_globals(&mut self, globals: &Globals) {
        (**self).set_globals(globals)
    }

    fn for_driver(&self, driver: &str) -> Option<Payload> {
        (**self).for_driver(driver)
    }

    fn is_custom(&self) -> bool {
        (**self).is_custom()
    }
}

/// Sets `payload[key] = value` unless the key already holds a non-null value.
pub fn fill_unset(payload: &mut Payload, key: &str, value: &str) {
    match payload.get(key) {
        Some(existing) if !existing.is_null() => {}
        _ => {
            payload.insert(key.to_owned(), Value::String(value.to_owned()));
        }
    }
}

/// Serializes `value` into a payload. Anything that is not a JSON object
/// yields an empty payload.
pub fn to_payload<T: serde::Serialize + ?Sized>(value: &T) -> Payload {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        Ok(_) | Err(_) => Payload::new(),
    }
}

/// Generic named event with a free-form payload.
///
/// Its merge hook fills every unset top-level key for each global that is set.
///
/// ```
/// use serde_json::json;
/// use trackify::{Event, Globals, TrackEvent};
///
/// let mut event = TrackEvent::new("add_to_wishlist", json!({"sku": "A-1"})).unwrap();
/// event.set_globals(&Globals::default().with_currency("USD"));
/// assert_eq!(event.data()["currency"], "USD");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TrackEvent {
    name: Cow<'static, str>,
    payload: Payload,
    label: Option<String>,
}

impl TrackEvent {
    /// Creates an event from a JSON value, which must be an object.
    pub fn new(name: impl Into<Cow<'static, str>>, payload: Value) -> Result<Self> {
        match payload {
            Value::Object(map) => Self::from_payload(name, map),
            other => Err(Error::InvalidEvent(format!(
                "payload must be an object, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn from_payload(name: impl Into<Cow<'static, str>>, payload: Payload) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::InvalidEvent("event name is empty".into()));
        }
        Ok(Self {
            name,
            payload,
            label: None,
        })
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}

impl Event for TrackEvent {
    fn name(&self) -> Cow<'static, str> {
        self.name.clone()
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn data(&self) -> Payload {
        self.payload.clone()
    }

    fn set_globals(&mut self, globals: &Globals) {
        for (key, value) in globals.entries() {
            fill_unset(&mut self.payload, key, value);
        }
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_globals_fill_missing_currency() {
        let mut event = TrackEvent::new("view", json!({"value": 10})).unwrap();
        event.set_globals(&Globals::default().with_currency("USD"));
        assert_eq!(event.data()["currency"], "USD");
    }

    #[test]
    fn test_globals_keep_existing_currency() {
        let mut event = TrackEvent::new("view", json!({"currency": "EUR"})).unwrap();
        event.set_globals(&Globals::default().with_currency("USD"));
        assert_eq!(event.data()["currency"], "EUR");
    }

    #[test]
    fn test_null_counts_as_unset() {
        let mut event = TrackEvent::new("view", json!({"brand": null})).unwrap();
        event.set_globals(&Globals::default().with_brand("Acme"));
        assert_eq!(event.data()["brand"], "Acme");
    }

    #[test]
    fn test_rejects_non_object_payload() {
        let err = TrackEvent::new("view", json!([1, 2])).unwrap_err();
        assert!(matches!(err, Error::InvalidEvent(_)));
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn test_rejects_empty_name() {
        assert!(TrackEvent::new("  ", json!({})).is_err());
    }

    #[test]
    fn test_custom_prefix_detection() {
        let custom = TrackEvent::new("custom.newsletter", json!({})).unwrap();
        let plain = TrackEvent::new("newsletter", json!({})).unwrap();
        assert!(custom.is_custom());
        assert!(!plain.is_custom());
    }

    #[test]
    fn test_label() {
        let event = TrackEvent::new("view", json!({}))
            .unwrap()
            .with_label("hero banner");
        assert_eq!(event.label(), Some("hero banner"));
    }
}
