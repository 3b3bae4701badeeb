use std::sync::Arc;

use async_trait::async_trait;

use crate::{Driver, Event, Result};

/// Placeholder for backends that only exist on the client.
///
/// `load()` answers `false`, so the tracker drops it before any event is
/// offered.
#[derive(Debug, Clone)]
pub struct ServerStubDriver {
    name: Arc<str>,
}

impl ServerStubDriver {
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
        }
    }
}

#[async_trait]
impl Driver for ServerStubDriver {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&mut self) -> Result<bool> {
        Ok(false)
    }

    fn supports_event(&self, _event: &dyn Event) -> bool {
        false
    }

    async fn track(&self, _event: &dyn Event) -> Result<()> {
        Ok(())
    }
}
