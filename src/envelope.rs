use std::{borrow::Cow, sync::Arc};

use crate::{Event, EventId, Meta};

/// A queued event plus its metadata.
///
/// The event sits behind an `Arc` so one envelope can be handed to every
/// supporting driver without copying the payload. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub meta: Meta,
    pub event: Arc<dyn Event>,
}

impl Envelope {
    pub fn new<E: Event>(event: E) -> Self {
        Self {
            meta: Meta::new(),
            event: Arc::new(event),
        }
    }

    pub fn id(&self) -> EventId {
        self.meta.id()
    }

    /// Routing name of the wrapped event.
    #[inline]
    pub fn name(&self) -> Cow<'static, str> {
        self.event.name()
    }

    #[inline]
    pub fn event(&self) -> &dyn Event {
        self.event.as_ref()
    }
}
