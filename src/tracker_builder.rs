use std::sync::Arc;

use crate::{
    Config, DriverRegistry, ErrorReporter, Tracker, TracingReporter, internal::Dispatcher,
};

/// Builder for a [`Tracker`] with a custom error sink.
///
/// ```rust
/// use trackify::{Config, DriverRegistry, Error, Tracker};
///
/// let tracker = Tracker::builder(DriverRegistry::new())
///     .config(Config::default())
///     .reporter(|error: &Error| eprintln!("tracking failed: {error}"))
///     .build();
/// ```
pub struct TrackerBuilder {
    registry: DriverRegistry,
    config: Config,
    reporter: Arc<dyn ErrorReporter>,
}

impl TrackerBuilder {
    pub fn new(registry: DriverRegistry) -> Self {
        Self {
            registry,
            config: Config::default(),
            reporter: Arc::new(TracingReporter),
        }
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn reporter<R: ErrorReporter>(mut self, reporter: R) -> Self {
        self.reporter = Arc::new(reporter);
        self
    }

    /// Use a reporter that is also held elsewhere, e.g. to inspect it in tests.
    pub fn shared_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn build(self) -> Tracker {
        let dispatcher = Arc::new(Dispatcher::new(self.reporter));
        Tracker::from_parts(self.config, self.registry, dispatcher)
    }
}
