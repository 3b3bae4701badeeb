//! Test doubles for asserting on driver delivery.
//!
//! Enable with the `test-harness` feature:
//!
//! ```toml
//! [dev-dependencies]
//! trackify = { version = "0.1", features = ["test-harness"] }
//! ```
//!
//! # Example
//!
//! ```ignore
//! let mut registry = DriverRegistry::new();
//! let (token, spy) = RecordingDriver::new("spy").register(&mut registry);
//! let reporter = CollectingReporter::default();
//! let tracker = Tracker::builder(registry).reporter(reporter.clone()).build();
//!
//! tracker.use_driver(token, None)?;
//! tracker.load_drivers().await;
//! tracker.track(event);
//! tracker.flush().await;
//!
//! assert_eq!(spy.tracked_names(), vec!["page_view"]);
//! assert!(reporter.is_empty());
//! ```

mod collecting_reporter;
mod driver_spy;
mod recording_driver;

pub use collecting_reporter::{CollectingReporter, ReportedError};
pub use driver_spy::{DriverSpy, TrackedEvent};
pub use recording_driver::{
    ConstructBehavior, LoadBehavior, RecordingDriver, SupportsBehavior, TrackBehavior,
};
