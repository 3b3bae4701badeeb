use std::sync::Arc;

use async_trait::async_trait;

use crate::{Event, Result};

/// Open key-value configuration handed to a driver's constructor.
pub type DriverConfig = serde_json::Map<String, serde_json::Value>;

/// Builds a driver instance from its registration config.
///
/// Returning an error excludes the driver the same way a failed
/// [`Driver::load`] does.
pub type DriverConstructor = Arc<dyn Fn(DriverConfig) -> Result<Box<dyn Driver>> + Send + Sync>;

/// Capability implemented by every tracking backend.
///
/// The [`Tracker`](crate::Tracker) drives each instance through a fixed
/// lifecycle:
///
/// 1. constructed from its [`DriverConfig`],
/// 2. probed once with [`load`](Driver::load); only drivers answering
///    `Ok(true)` stay active,
/// 3. offered every event: [`supports_event`](Driver::supports_event) first,
///    then [`track`](Driver::track) for the events it accepts.
///
/// `track` calls for the same driver may run concurrently (one task per
/// event), so implementations keep shared state behind their own
/// synchronization. Errors returned from `load` or `track` are reported and
/// contained; they never reach the application or other drivers.
///
/// Drivers bound their own latency. A `load` that polls for an external
/// backend should give up after a timeout, see [`poll_until`](crate::drivers::poll_until).
#[async_trait]
pub trait Driver: Send + Sync + 'static {
    /// Name used in logs, error reports and custom-event lookups.
    fn name(&self) -> &str;

    /// Readiness probe, called once before the driver receives events.
    ///
    /// A backend that appears asynchronously is awaited with a bounded poll:
    ///
    /// ```
    /// use std::{sync::{Arc, atomic::{AtomicBool, Ordering}}, time::Duration};
    ///
    /// use async_trait::async_trait;
    /// use trackify::{Driver, Event, Result, drivers::poll_until};
    ///
    /// struct PixelDriver {
    ///     script_ready: Arc<AtomicBool>,
    /// }
    ///
    /// #[async_trait]
    /// impl Driver for PixelDriver {
    ///     fn name(&self) -> &str {
    ///         "PixelDriver"
    ///     }
    ///
    ///     async fn load(&mut self) -> Result<bool> {
    ///         let ready = self.script_ready.clone();
    ///         Ok(poll_until(Duration::from_millis(250), Duration::from_millis(1500), || {
    ///             ready.load(Ordering::Acquire)
    ///         })
    ///         .await)
    ///     }
    ///
    ///     fn supports_event(&self, _event: &dyn Event) -> bool {
    ///         true
    ///     }
    ///
    ///     async fn track(&self, _event: &dyn Event) -> Result<()> {
    ///         Ok(())
    ///     }
    /// }
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() -> Result {
    /// let mut driver = PixelDriver { script_ready: Arc::new(AtomicBool::new(true)) };
    /// assert!(driver.load().await?);
    /// # Ok(())
    /// # }
    /// ```
    async fn load(&mut self) -> Result<bool>;

    /// Whether [`track`](Driver::track) should be called for `event`.
    fn supports_event(&self, event: &dyn Event) -> bool;

    /// Forwards a single event to the backend.
    async fn track(&self, event: &dyn Event) -> Result<()>;
}

/// Wraps a plain constructor function as a [`DriverConstructor`].
///
/// ```
/// use trackify::{constructor, drivers::DebugDriver};
///
/// let make_debug = constructor(|_config| Ok(DebugDriver::new()));
/// assert!(make_debug(Default::default()).is_ok());
/// ```
pub fn constructor<D, F>(f: F) -> DriverConstructor
where
    D: Driver,
    F: Fn(DriverConfig) -> Result<D> + Send + Sync + 'static,
{
    Arc::new(move |config| Ok(Box::new(f(config)?) as Box<dyn Driver>))
}
