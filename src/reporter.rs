use crate::Error;

/// Sink for every failure the [`Tracker`](crate::Tracker) contains.
///
/// Driver load and track failures never reach the caller of
/// [`Tracker::track`](crate::Tracker::track); they are handed here instead.
/// Implementations must not panic and should return quickly, as `report` may
/// be called from the drain loop.
pub trait ErrorReporter: Send + Sync + 'static {
    fn report(&self, error: &Error);
}

/// Default reporter: logs through `tracing` at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, error: &Error) {
        match error {
            Error::DriverDeclined { driver } => {
                tracing::info!(%driver, "Driver declined to load, skipping");
            }
            Error::DriverTrack {
                driver,
                event,
                source,
            } => {
                tracing::error!(%driver, %event, error = %source, "Driver failed to track event");
            }
            other => tracing::error!(error = %other, "[Trackify]"),
        }
    }
}

impl<F> ErrorReporter for F
where
    F: Fn(&Error) + Send + Sync + 'static,
{
    fn report(&self, error: &Error) {
        self(error)
    }
}
