use std::{borrow::Cow, collections::HashMap};

use serde_json::Value;

use crate::{CUSTOM_PREFIX, Error, Event, Payload, Result, event::json_kind};

/// Application-defined event carrying a separate payload per driver.
///
/// Its name always starts with `custom.`. Drivers that handle custom events
/// ask for their own payload by name through [`Event::for_driver`]; a driver
/// without one skips the event.
///
/// ```
/// use serde_json::json;
/// use trackify::{Event, events::CustomEvent};
///
/// let event = CustomEvent::new("newsletter_popup")
///     .unwrap()
///     .with_driver_payload("GTMBrowserDriver", json!({
///         "event_type": "common",
///         "event_name": "popup_shown",
///         "event_payload": {"variant": "b"},
///     }))
///     .unwrap();
///
/// assert_eq!(event.name(), "custom.newsletter_popup");
/// assert!(event.for_driver("GTMBrowserDriver").is_some());
/// assert!(event.for_driver("DebugDriver").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomEvent {
    name: String,
    data: Payload,
    drivers: HashMap<String, Payload>,
    label: Option<String>,
}

impl CustomEvent {
    /// `name` gets the `custom.` prefix unless it already has it.
    pub fn new(name: impl AsRef<str>) -> Result<Self> {
        let name = name.as_ref().trim();
        let bare = name.strip_prefix(CUSTOM_PREFIX).unwrap_or(name);
        if bare.is_empty() {
            return Err(Error::InvalidEvent("custom event name is empty".into()));
        }
        Ok(Self {
            name: format!("{CUSTOM_PREFIX}{bare}"),
            ..Default::default()
        })
    }

    /// Payload returned by [`Event::data`], for drivers that log everything.
    pub fn with_data(mut self, data: Payload) -> Self {
        self.data = data;
        self
    }

    /// Sets the payload meant for the driver called `driver`. Must be an object.
    pub fn with_driver_payload(mut self, driver: impl Into<String>, payload: Value) -> Result<Self> {
        match payload {
            Value::Object(map) => {
                self.drivers.insert(driver.into(), map);
                Ok(self)
            }
            other => Err(Error::InvalidEvent(format!(
                "driver payload of {} must be an object, got {}",
                self.name,
                json_kind(&other)
            ))),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl Event for CustomEvent {
    fn name(&self) -> Cow<'static, str> {
        Cow::Owned(self.name.clone())
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn data(&self) -> Payload {
        self.data.clone()
    }

    fn for_driver(&self, driver: &str) -> Option<Payload> {
        self.drivers.get(driver).cloned()
    }

    fn is_custom(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_prefix_not_doubled() {
        let event = CustomEvent::new("custom.quiz").unwrap();
        assert_eq!(event.name(), "custom.quiz");
    }

    #[test]
    fn test_rejects_empty_name() {
        assert!(CustomEvent::new("custom.").is_err());
        assert!(CustomEvent::new("").is_err());
    }

    #[test]
    fn test_rejects_non_object_driver_payload() {
        let err = CustomEvent::new("quiz")
            .unwrap()
            .with_driver_payload("gtm", json!("nope"))
            .unwrap_err();
        assert!(err.to_string().contains("a string"));
    }
}
