use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{Arc, OnceLock, PoisonError, RwLock},
};

use futures_util::FutureExt;
use tokio::runtime::Handle;
use tokio_util::task::TaskTracker;

use super::ActiveDriver;
use crate::{DriverToken, Envelope, Error, ErrorReporter};

/// Fans queued events out to the active drivers.
///
/// Owned jointly by the [`Tracker`](crate::Tracker) and the queue's drain
/// callback. Each `track` call runs on its own task so a slow or failing
/// driver never holds up the queue or its peers.
pub(crate) struct Dispatcher {
    drivers: RwLock<Vec<ActiveDriver>>,
    reporter: Arc<dyn ErrorReporter>,
    tasks: TaskTracker,
    runtime: OnceLock<Handle>,
}

impl Dispatcher {
    pub(crate) fn new(reporter: Arc<dyn ErrorReporter>) -> Self {
        Self {
            drivers: RwLock::new(Vec::new()),
            reporter,
            tasks: TaskTracker::new(),
            runtime: OnceLock::new(),
        }
    }

    #[inline]
    pub(crate) fn report(&self, error: Error) {
        self.reporter.report(&error);
    }

    /// Remembers the runtime `track` tasks are spawned on.
    pub(crate) fn bind_runtime(&self, handle: Handle) {
        let _ = self.runtime.set(handle);
    }

    /// Adds a loaded driver. A token loaded twice keeps its first position
    /// and the newest instance.
    pub(crate) fn activate(&self, active: ActiveDriver) {
        let mut drivers = self.drivers.write().unwrap_or_else(PoisonError::into_inner);
        match drivers.iter_mut().find(|d| d.token == active.token) {
            Some(slot) => *slot = active,
            None => drivers.push(active),
        }
    }

    pub(crate) fn tokens(&self) -> Vec<DriverToken> {
        self.drivers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|d| d.token.clone())
            .collect()
    }

    pub(crate) fn dispatch(&self, envelope: Envelope) {
        let drivers = self
            .drivers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for active in drivers {
            let supported =
                catch_unwind(AssertUnwindSafe(|| active.driver.supports_event(envelope.event())));
            match supported {
                Ok(true) => self.spawn_track(active, envelope.clone()),
                Ok(false) => {
                    tracing::trace!(driver = %active.name, event = %envelope.name(), "Event not supported, skipping");
                }
                Err(_) => self.report(Error::DriverPanicked {
                    driver: active.name.clone(),
                    event: envelope.name(),
                }),
            }
        }
    }

    fn spawn_track(&self, active: ActiveDriver, envelope: Envelope) {
        let Some(handle) = self
            .runtime
            .get()
            .cloned()
            .or_else(|| Handle::try_current().ok())
        else {
            self.report(Error::External(
                "no Tokio runtime available to run driver tasks".into(),
            ));
            return;
        };

        let reporter = self.reporter.clone();
        self.tasks.spawn_on(
            async move {
                let event = envelope.name();
                let outcome = AssertUnwindSafe(active.driver.track(envelope.event()))
                    .catch_unwind()
                    .await;
                match outcome {
                    Ok(Ok(())) => {
                        tracing::trace!(driver = %active.name, %event, id = %envelope.id(), "Event tracked");
                    }
                    Ok(Err(e)) => reporter.report(&Error::DriverTrack {
                        driver: active.name.clone(),
                        event,
                        source: Box::new(e),
                    }),
                    Err(_) => reporter.report(&Error::DriverPanicked {
                        driver: active.name.clone(),
                        event,
                    }),
                }
            },
            &handle,
        );
    }

    /// Waits for every `track` task spawned so far.
    pub(crate) async fn flush(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.tasks.len()
    }
}
