use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::Payload;

/// Snapshot of an event received by a [`RecordingDriver`](super::RecordingDriver).
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedEvent {
    pub name: String,
    pub label: Option<String>,
    pub data: Payload,
}

#[derive(Debug, Default)]
struct SpyState {
    constructed: usize,
    loaded: bool,
    offered: Vec<String>,
    attempted: Vec<String>,
    tracked: Vec<TrackedEvent>,
}

/// Read side of a [`RecordingDriver`](super::RecordingDriver).
///
/// Shared by every instance built from the same template, so it keeps
/// working after the driver has been moved into a tracker.
#[derive(Debug, Clone, Default)]
pub struct DriverSpy {
    state: Arc<Mutex<SpyState>>,
}

impl DriverSpy {
    fn state(&self) -> MutexGuard<'_, SpyState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn record_constructed(&self) {
        self.state().constructed += 1;
    }

    pub(crate) fn record_loaded(&self) {
        self.state().loaded = true;
    }

    pub(crate) fn record_offered(&self, name: &str) {
        self.state().offered.push(name.to_owned());
    }

    pub(crate) fn record_attempt(&self, name: &str) {
        self.state().attempted.push(name.to_owned());
    }

    pub(crate) fn record_tracked(&self, event: TrackedEvent) {
        self.state().tracked.push(event);
    }

    /// How many times the driver's constructor ran.
    pub fn constructed(&self) -> usize {
        self.state().constructed
    }

    /// Whether `load()` was called and answered `true`.
    pub fn is_loaded(&self) -> bool {
        self.state().loaded
    }

    /// Names passed to `supports_event`, in call order.
    pub fn offered(&self) -> Vec<String> {
        self.state().offered.clone()
    }

    /// Names passed to `track`, whatever the outcome.
    pub fn attempted(&self) -> Vec<String> {
        self.state().attempted.clone()
    }

    /// Events that reached `track` and succeeded, in completion order.
    pub fn tracked(&self) -> Vec<TrackedEvent> {
        self.state().tracked.clone()
    }

    pub fn tracked_names(&self) -> Vec<String> {
        self.state().tracked.iter().map(|e| e.name.clone()).collect()
    }

    pub fn tracked_count(&self) -> usize {
        self.state().tracked.len()
    }
}
