use std::sync::Arc;

use crate::{Driver, DriverToken};

/// A driver whose `load()` probe succeeded.
#[derive(Clone)]
pub(crate) struct ActiveDriver {
    pub(crate) token: DriverToken,
    pub(crate) name: Arc<str>,
    pub(crate) driver: Arc<dyn Driver>,
}

impl ActiveDriver {
    pub(crate) fn new(token: DriverToken, driver: Box<dyn Driver>) -> Self {
        Self {
            token,
            name: Arc::from(driver.name()),
            driver: Arc::from(driver),
        }
    }
}

impl std::fmt::Debug for ActiveDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveDriver")
            .field("token", &self.token)
            .field("name", &self.name)
            .finish()
    }
}
