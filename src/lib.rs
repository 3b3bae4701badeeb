//! Trackify: fan-out of behavioral analytics events to tracking drivers.
//!
//! Applications register drivers (tag managers, CRM pixels, loggers) by
//! [`DriverToken`], load them once, and call [`Tracker::track`] from anywhere.
//! Events tracked before the drivers finish loading are queued and delivered
//! in order once loading completes. A driver that fails to load, rejects an
//! event, or panics is reported through the [`ErrorReporter`] and never
//! affects the other drivers.
//!
//! ```
//! use trackify::{Config, DriverRegistry, Globals, Tracker, drivers::DataLayers, events, tokens};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> trackify::Result {
//! let config = Config::default().with_globals(Globals::default().with_currency("USD"));
//! let registry = DriverRegistry::builtin(config.environment, DataLayers::default());
//! let tracker = Tracker::new(config, registry);
//!
//! tracker.use_driver(tokens::DEBUG.clone(), None)?;
//! tracker.track(events::PageViewEvent::new("/", "Home"));
//! tracker.load_drivers().await;
//! tracker.flush().await;
//! # Ok(())
//! # }
//! ```

mod config;
mod driver;
mod driver_token;
mod envelope;
mod error;
mod event;
mod globals;
mod internal;
mod meta;
mod queue;
mod registry;
mod reporter;
mod tracker;
mod tracker_builder;

pub mod drivers;
pub mod events;

#[cfg(any(test, feature = "test-harness"))]
pub mod testing;

pub use config::{Config, Environment};
pub use driver::{Driver, DriverConfig, DriverConstructor, constructor};
pub use driver_token::{DriverToken, tokens};
pub use envelope::Envelope;
pub use error::Error;
pub use event::{CUSTOM_PREFIX, Event, Payload, TrackEvent, fill_unset, to_payload};
pub use globals::Globals;
pub use meta::Meta;
pub use queue::{EventQueue, ProcessedCallback};
pub use registry::{DriverRegistry, DriverResolver};
pub use reporter::{ErrorReporter, TracingReporter};
pub use tracker::{Phase, Tracker};
pub use tracker_builder::TrackerBuilder;

/// Derives [`Event`] for a `Serialize` struct.
///
/// The event name defaults to the snake_case type name and can be set with
/// `#[event(name = "...")]`. The payload is the struct serialized to JSON.
#[cfg(feature = "macros")]
pub use trackify_macros::Event;

pub type Result<T = ()> = std::result::Result<T, Error>;

/// Unique id assigned to every tracked event.
pub type EventId = u128;
