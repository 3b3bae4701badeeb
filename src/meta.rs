use std::time::SystemTime;

use uuid::Uuid;

use crate::EventId;

/// Metadata stamped on every event when it enters the queue.
///
/// - `id`: unique identifier of the queued event, used to correlate log
///   lines emitted by different drivers for the same event.
/// - `timestamp`: enqueue time in nanoseconds since Unix epoch (truncated to `u64`).
#[derive(Debug, Clone)]
pub struct Meta {
    id: EventId,
    timestamp: u64,
}

impl Meta {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().as_u128(),
            timestamp: SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or_default(),
        }
    }

    /// Unique identifier of the queued event.
    pub fn id(&self) -> EventId {
        self.id
    }

    /// Timestamp in nanoseconds since Unix epoch (u64 truncation).
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

impl Default for Meta {
    fn default() -> Self {
        Self::new()
    }
}
