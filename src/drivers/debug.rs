use async_trait::async_trait;

use crate::{Driver, Event, Result};

/// Accepts every event and logs each call at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebugDriver;

impl DebugDriver {
    pub const NAME: &'static str = "DebugDriver";

    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Driver for DebugDriver {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn load(&mut self) -> Result<bool> {
        tracing::debug!(driver = Self::NAME, "Method `load` called.");
        Ok(true)
    }

    fn supports_event(&self, event: &dyn Event) -> bool {
        tracing::debug!(driver = Self::NAME, event = %event.name(), "Method `supports_event` called.");
        true
    }

    async fn track(&self, event: &dyn Event) -> Result<()> {
        tracing::debug!(
            driver = Self::NAME,
            event = %event.name(),
            label = ?event.label(),
            data = ?event.data(),
            "Method `track` called."
        );
        Ok(())
    }
}
