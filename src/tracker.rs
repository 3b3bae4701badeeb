use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use futures_util::{FutureExt, future::join_all};
use tokio::runtime::Handle;

use crate::{
    Config, DriverConfig, DriverRegistry, DriverToken, Envelope, Error, Event, EventQueue,
    Globals, Result, TrackerBuilder,
    internal::{ActiveDriver, Dispatcher},
};

/// Lifecycle of a [`Tracker`]. Phases only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// Drivers may be registered; events are buffered.
    Registration,
    /// `load_drivers` is resolving and probing drivers; events are buffered.
    Loading,
    /// The queue is open and every event is fanned out to the active drivers.
    Running,
}

#[derive(Debug)]
struct Registration {
    token: DriverToken,
    config: Option<DriverConfig>,
}

struct Inner {
    config: Config,
    registry: DriverRegistry,
    registrations: Mutex<Vec<Registration>>,
    phase: Mutex<Phase>,
    queue: EventQueue<Envelope>,
    dispatcher: Arc<Dispatcher>,
}

/// Coordinates drivers and the event queue.
///
/// - Register drivers with [`use_driver`](Tracker::use_driver) /
///   [`use_drivers`](Tracker::use_drivers).
/// - [`load_drivers`](Tracker::load_drivers) resolves, constructs and probes
///   each of them, then opens the queue.
/// - [`track`](Tracker::track) merges the [`Globals`] into an event and
///   queues it. Events tracked before loading completes are buffered and
///   delivered in order afterwards.
/// - [`flush`](Tracker::flush) waits for in-flight driver calls.
///
/// Driver failures never surface here: they go to the
/// [`ErrorReporter`](crate::ErrorReporter) given to the [`TrackerBuilder`].
///
/// `Tracker` is a cheap handle; clones share the same state.
///
/// # Example
///
/// ```
/// use trackify::{Config, DriverRegistry, Tracker, events::PageViewEvent, tokens};
/// use trackify::drivers::DataLayers;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> trackify::Result<()> {
/// let tracker = Tracker::new(
///     Config::default(),
///     DriverRegistry::builtin(Default::default(), DataLayers::default()),
/// );
/// tracker.use_driver(tokens::DEBUG.clone(), None)?;
///
/// tracker.track(PageViewEvent::new("/", "Home"));
/// tracker.load_drivers().await;
/// tracker.flush().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Tracker {
    inner: Arc<Inner>,
}

impl Tracker {
    /// Create a tracker reporting errors through `tracing`.
    pub fn new(config: Config, registry: DriverRegistry) -> Self {
        TrackerBuilder::new(registry).config(config).build()
    }

    pub fn builder(registry: DriverRegistry) -> TrackerBuilder {
        TrackerBuilder::new(registry)
    }

    pub(crate) fn from_parts(
        config: Config,
        registry: DriverRegistry,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        let queue = EventQueue::new();
        let fan_out = dispatcher.clone();
        queue.on_processed(move |envelope: Envelope| fan_out.dispatch(envelope));

        Self {
            inner: Arc::new(Inner {
                config,
                registry,
                registrations: Mutex::new(Vec::new()),
                phase: Mutex::new(Phase::Registration),
                queue,
                dispatcher,
            }),
        }
    }

    /// Register a driver by token. `None` hands the driver an empty config.
    ///
    /// Fails with [`Error::RegistrationClosed`] once loading has started.
    pub fn use_driver(&self, token: DriverToken, config: Option<DriverConfig>) -> Result<()> {
        let phase = self.phase_guard();
        if *phase != Phase::Registration {
            return Err(Error::RegistrationClosed);
        }
        tracing::debug!(driver = %token, "Driver registered");
        self.registrations().push(Registration { token, config });
        Ok(())
    }

    /// Register several drivers, keeping their order.
    pub fn use_drivers<I>(&self, drivers: I) -> Result<()>
    where
        I: IntoIterator<Item = (DriverToken, Option<DriverConfig>)>,
    {
        drivers
            .into_iter()
            .try_for_each(|(token, config)| self.use_driver(token, config))
    }

    /// Resolve, construct and probe every registered driver, then start
    /// delivering events.
    ///
    /// Each driver is handled in isolation: an unknown token, a failing
    /// constructor, a `load()` that errors, panics or answers `false` only
    /// excludes that driver and is reported. Calling this again, or while a
    /// previous call is still loading, does nothing.
    ///
    /// Dropping the returned future (e.g. under `tokio::time::timeout`) still
    /// opens the queue. Drivers loaded sequentially before the cancellation
    /// stay active; the rest are abandoned. With concurrent loading nothing
    /// is activated until every driver has answered.
    pub async fn load_drivers(&self) {
        {
            let mut phase = self.phase_guard();
            if *phase != Phase::Registration {
                tracing::debug!(phase = ?*phase, "Drivers already resolved");
                return;
            }
            *phase = Phase::Loading;
        }

        if let Ok(handle) = Handle::try_current() {
            self.inner.dispatcher.bind_runtime(handle);
        }

        let mut start = StartOnDrop {
            tracker: self,
            completed: false,
        };

        let registrations = std::mem::take(&mut *self.registrations());
        if self.inner.config.concurrent_loading {
            join_all(registrations.into_iter().map(|r| self.load_one(r)))
                .await
                .into_iter()
                .flatten()
                .for_each(|active| self.inner.dispatcher.activate(active));
        } else {
            for registration in registrations {
                if let Some(active) = self.load_one(registration).await {
                    self.inner.dispatcher.activate(active);
                }
            }
        }

        start.completed = true;
    }

    /// Opens the queue. Runs once, when loading finishes or is cancelled.
    fn start(&self, completed: bool) {
        *self.phase_guard() = Phase::Running;
        if !completed {
            tracing::warn!(
                drivers = self.inner.dispatcher.tokens().len(),
                "Driver loading cancelled, starting queue with drivers loaded so far"
            );
        }
        tracing::info!(
            drivers = self.inner.dispatcher.tokens().len(),
            pending = self.inner.queue.len(),
            "Drivers resolved, starting queue"
        );
        self.inner.queue.run();
    }

    async fn load_one(&self, registration: Registration) -> Option<ActiveDriver> {
        let Registration { token, config } = registration;

        let ctor = match self.inner.registry.resolve(&token).await {
            Ok(ctor) => ctor,
            Err(e) => {
                self.inner.dispatcher.report(e);
                return None;
            }
        };

        let config = config.unwrap_or_default();
        let mut driver = match catch_unwind(AssertUnwindSafe(|| ctor(config))) {
            Ok(Ok(driver)) => driver,
            Ok(Err(e)) => {
                self.report_load_failure(token.name(), e.to_string());
                return None;
            }
            Err(_) => {
                self.report_load_failure(token.name(), "constructor panicked".into());
                return None;
            }
        };

        let outcome = AssertUnwindSafe(driver.load()).catch_unwind().await;
        match outcome {
            Ok(Ok(true)) => {
                tracing::debug!(driver = %driver.name(), token = %token, "Driver loaded");
                Some(ActiveDriver::new(token, driver))
            }
            Ok(Ok(false)) => {
                self.inner.dispatcher.report(Error::DriverDeclined {
                    driver: Arc::from(driver.name()),
                });
                None
            }
            Ok(Err(e)) => {
                self.report_load_failure(driver.name(), e.to_string());
                None
            }
            Err(_) => {
                self.report_load_failure(driver.name(), "load panicked".into());
                None
            }
        }
    }

    fn report_load_failure(&self, driver: &str, reason: String) {
        self.inner.dispatcher.report(Error::DriverLoad {
            driver: Arc::from(driver),
            reason: Arc::from(reason),
        });
    }

    /// Merge the [`Globals`] into `event` and queue it.
    ///
    /// Never fails and never blocks on drivers. Before
    /// [`load_drivers`](Tracker::load_drivers) has finished, the event is
    /// buffered.
    pub fn track<E: Event>(&self, mut event: E) {
        event.set_globals(&self.inner.config.globals);
        let envelope = Envelope::new(event);
        tracing::trace!(event = %envelope.name(), id = %envelope.id(), "Event queued");
        self.inner.queue.push(envelope);
    }

    /// Wait until every driver call started so far has finished.
    ///
    /// Events still buffered behind a closed gate are not waited for.
    pub async fn flush(&self) {
        self.inner.dispatcher.flush().await;
    }

    /// Tokens of the drivers that loaded successfully, in registration order.
    pub fn active_drivers(&self) -> Vec<DriverToken> {
        self.inner.dispatcher.tokens()
    }

    pub fn phase(&self) -> Phase {
        *self.phase_guard()
    }

    pub fn globals(&self) -> &Globals {
        &self.inner.config.globals
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Events waiting for the queue to open.
    pub fn pending(&self) -> usize {
        self.inner.queue.len()
    }

    /// Driver calls currently running.
    pub fn in_flight(&self) -> usize {
        self.inner.dispatcher.in_flight()
    }

    fn phase_guard(&self) -> MutexGuard<'_, Phase> {
        self.inner.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn registrations(&self) -> MutexGuard<'_, Vec<Registration>> {
        self.inner
            .registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Moves a tracker to [`Phase::Running`] even if `load_drivers` is dropped
/// before it finishes.
struct StartOnDrop<'a> {
    tracker: &'a Tracker,
    completed: bool,
}

impl Drop for StartOnDrop<'_> {
    fn drop(&mut self) {
        self.tracker.start(self.completed);
    }
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("phase", &self.phase())
            .field("active_drivers", &self.active_drivers())
            .field("queue", &self.inner.queue)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::{
        TrackEvent,
        testing::{
            CollectingReporter, ConstructBehavior, LoadBehavior, RecordingDriver, SupportsBehavior,
            TrackBehavior,
        },
    };

    fn event(name: &str) -> TrackEvent {
        TrackEvent::new(name.to_owned(), json!({})).unwrap()
    }

    fn tracker_with(registry: DriverRegistry, config: Config) -> (Tracker, CollectingReporter) {
        let reporter = CollectingReporter::default();
        let tracker = Tracker::builder(registry)
            .config(config)
            .reporter(reporter.clone())
            .build();
        (tracker, reporter)
    }

    #[tokio::test]
    async fn test_events_before_load_are_delivered_in_order() {
        let mut registry = DriverRegistry::new();
        let (token, spy) = RecordingDriver::new("spy").register(&mut registry);
        let (tracker, reporter) = tracker_with(registry, Config::default());
        tracker.use_driver(token, None).unwrap();

        tracker.track(event("a"));
        tracker.track(event("b"));
        tracker.track(event("c"));
        assert_eq!(tracker.pending(), 3);
        assert!(spy.offered().is_empty());

        tracker.load_drivers().await;
        tracker.track(event("d"));
        tracker.flush().await;

        assert_eq!(spy.offered(), vec!["a", "b", "c", "d"]);
        assert_eq!(spy.tracked_count(), 4);
        assert_eq!(tracker.pending(), 0);
        assert!(reporter.is_empty());
    }

    #[tokio::test]
    async fn test_failing_driver_does_not_affect_others() {
        let mut registry = DriverRegistry::new();
        let (failing, failing_spy) = RecordingDriver::new("failing")
            .with_track(TrackBehavior::Fail)
            .register(&mut registry);
        let (panicking, _) = RecordingDriver::new("panicking")
            .with_track(TrackBehavior::Panic)
            .register(&mut registry);
        let (healthy, healthy_spy) = RecordingDriver::new("healthy").register(&mut registry);
        let (tracker, reporter) = tracker_with(registry, Config::default());
        tracker
            .use_drivers([(failing, None), (panicking, None), (healthy, None)])
            .unwrap();
        tracker.load_drivers().await;

        tracker.track(event("purchase"));
        tracker.track(event("page_view"));
        tracker.flush().await;

        assert_eq!(failing_spy.attempted().len(), 2);
        assert_eq!(failing_spy.tracked_count(), 0);
        assert_eq!(healthy_spy.tracked_count(), 2);
        assert_eq!(reporter.count_of("DriverTrack"), 2);
        assert_eq!(reporter.count_of("DriverPanicked"), 2);
        assert!(
            reporter
                .errors()
                .iter()
                .any(|e| e.message.contains("failing rejected purchase"))
        );
    }

    #[tokio::test]
    async fn test_load_failures_exclude_only_that_driver() {
        let mut registry = DriverRegistry::new();
        let (first, _) = RecordingDriver::new("first").register(&mut registry);
        let (declined, _) = RecordingDriver::new("declined")
            .with_load(LoadBehavior::Decline)
            .register(&mut registry);
        let (broken, broken_spy) = RecordingDriver::new("broken")
            .with_load(LoadBehavior::Fail)
            .register(&mut registry);
        let (panicking, _) = RecordingDriver::new("panicking")
            .with_load(LoadBehavior::Panic)
            .register(&mut registry);
        let (last, last_spy) = RecordingDriver::new("last").register(&mut registry);
        let unknown = DriverToken::new("unknown");

        let (tracker, reporter) = tracker_with(registry, Config::default());
        tracker
            .use_drivers([
                (first.clone(), None),
                (declined, None),
                (unknown, None),
                (broken, None),
                (panicking, None),
                (last.clone(), None),
            ])
            .unwrap();
        tracker.load_drivers().await;

        assert_eq!(tracker.active_drivers(), vec![first, last]);
        assert_eq!(reporter.count_of("DriverDeclined"), 1);
        assert_eq!(reporter.count_of("UnknownDriver"), 1);
        assert_eq!(reporter.count_of("DriverLoad"), 2);

        tracker.track(event("view_cart"));
        tracker.flush().await;
        assert_eq!(broken_spy.constructed(), 1);
        assert!(broken_spy.offered().is_empty());
        assert_eq!(last_spy.tracked_names(), vec!["view_cart"]);
    }

    #[tokio::test]
    async fn test_unsupported_events_are_skipped_silently() {
        let mut registry = DriverRegistry::new();
        let (token, spy) = RecordingDriver::new("sales")
            .supporting(&["purchase"])
            .register(&mut registry);
        let (tracker, reporter) = tracker_with(registry, Config::default());
        tracker.use_driver(token, None).unwrap();
        tracker.load_drivers().await;

        tracker.track(event("page_view"));
        tracker.track(event("purchase"));
        tracker.flush().await;

        assert_eq!(spy.offered(), vec!["page_view", "purchase"]);
        assert_eq!(spy.tracked_names(), vec!["purchase"]);
        assert!(reporter.is_empty());
    }

    #[tokio::test]
    async fn test_globals_fill_but_never_override() {
        let mut registry = DriverRegistry::new();
        let (token, spy) = RecordingDriver::new("spy").register(&mut registry);
        let config = Config::default().with_globals(Globals::default().with_currency("USD"));
        let (tracker, _) = tracker_with(registry, config);
        tracker.use_driver(token, None).unwrap();
        tracker.load_drivers().await;

        tracker.track(TrackEvent::new("a", json!({"value": 1})).unwrap());
        tracker.flush().await;
        tracker.track(TrackEvent::new("b", json!({"currency": "EUR"})).unwrap());
        tracker.flush().await;

        let tracked = spy.tracked();
        assert_eq!(tracked[0].data["currency"], "USD");
        assert_eq!(tracked[1].data["currency"], "EUR");
    }

    #[tokio::test]
    async fn test_lifecycle_is_one_way() {
        let mut registry = DriverRegistry::new();
        let (token, spy) = RecordingDriver::new("spy").register(&mut registry);
        let (tracker, _) = tracker_with(registry, Config::default());
        assert_eq!(tracker.phase(), Phase::Registration);
        tracker.use_driver(token.clone(), None).unwrap();

        tracker.load_drivers().await;
        assert_eq!(tracker.phase(), Phase::Running);
        tracker.load_drivers().await;
        assert_eq!(spy.constructed(), 1);

        let err = tracker.use_driver(token, None).unwrap_err();
        assert!(matches!(err, Error::RegistrationClosed));
    }

    #[tokio::test]
    async fn test_concurrent_loading_keeps_registration_order() {
        let mut registry = DriverRegistry::new();
        let tokens: Vec<DriverToken> = (0..5)
            .map(|i| RecordingDriver::new(&format!("d{i}")).register(&mut registry).0)
            .collect();
        let config = Config::default().with_concurrent_loading(true);
        let (tracker, reporter) = tracker_with(registry, config);
        tracker
            .use_drivers(tokens.iter().cloned().map(|t| (t, None)))
            .unwrap();
        tracker.load_drivers().await;

        assert_eq!(tracker.active_drivers(), tokens);
        assert!(reporter.is_empty());
    }

    #[tokio::test]
    async fn test_slow_driver_does_not_block_queue() {
        let mut registry = DriverRegistry::new();
        let (slow, slow_spy) = RecordingDriver::new("slow")
            .with_delay(std::time::Duration::from_millis(50))
            .register(&mut registry);
        let (fast, fast_spy) = RecordingDriver::new("fast").register(&mut registry);
        let (tracker, _) = tracker_with(registry, Config::default());
        tracker.use_drivers([(slow, None), (fast, None)]).unwrap();
        tracker.load_drivers().await;

        for name in ["a", "b", "c"] {
            tracker.track(event(name));
        }
        assert_eq!(tracker.pending(), 0);
        tracker.flush().await;

        assert_eq!(slow_spy.tracked_count(), 3);
        assert_eq!(fast_spy.tracked_count(), 3);
        assert_eq!(tracker.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_failing_constructors_are_skipped() {
        let mut registry = DriverRegistry::new();
        let (rejecting, _) = RecordingDriver::new("rejecting")
            .with_construct(ConstructBehavior::Fail)
            .register(&mut registry);
        let (panicking, panicking_spy) = RecordingDriver::new("panicking")
            .with_construct(ConstructBehavior::Panic)
            .register(&mut registry);
        let (healthy, healthy_spy) = RecordingDriver::new("healthy").register(&mut registry);
        let (tracker, reporter) = tracker_with(registry, Config::default());
        tracker
            .use_drivers([(rejecting, None), (panicking, None), (healthy.clone(), None)])
            .unwrap();
        tracker.load_drivers().await;

        assert_eq!(tracker.active_drivers(), vec![healthy]);
        assert_eq!(reporter.kinds(), vec!["DriverLoad", "DriverLoad"]);
        assert!(reporter.errors()[0].message.contains("rejecting rejected its config"));
        assert_eq!(panicking_spy.constructed(), 1);
        assert!(!panicking_spy.is_loaded());

        tracker.track(event("view_item"));
        tracker.flush().await;
        assert_eq!(healthy_spy.tracked_names(), vec!["view_item"]);
    }

    #[tokio::test]
    async fn test_panicking_support_check_is_contained() {
        let mut registry = DriverRegistry::new();
        let (broken, broken_spy) = RecordingDriver::new("broken")
            .with_supports(SupportsBehavior::Panic)
            .register(&mut registry);
        let (healthy, healthy_spy) = RecordingDriver::new("healthy").register(&mut registry);
        let (tracker, reporter) = tracker_with(registry, Config::default());
        tracker.use_drivers([(broken, None), (healthy, None)]).unwrap();
        tracker.load_drivers().await;

        tracker.track(event("a"));
        tracker.track(event("b"));
        tracker.flush().await;

        assert_eq!(broken_spy.offered(), vec!["a", "b"]);
        assert!(broken_spy.attempted().is_empty());
        assert_eq!(healthy_spy.tracked_names().len(), 2);
        assert_eq!(reporter.kinds(), vec!["DriverPanicked", "DriverPanicked"]);
        assert!(!tracker.inner.queue.is_processing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_loading_still_opens_queue() {
        let mut registry = DriverRegistry::new();
        let (ok, ok_spy) = RecordingDriver::new("ok").register(&mut registry);
        let (hung, hung_spy) = RecordingDriver::new("hung")
            .with_load(LoadBehavior::Hang)
            .register(&mut registry);
        let (tracker, _) = tracker_with(registry, Config::default());
        tracker.use_drivers([(ok.clone(), None), (hung, None)]).unwrap();

        let loading = tokio::time::timeout(Duration::from_secs(5), tracker.load_drivers()).await;
        assert!(loading.is_err());
        assert_eq!(tracker.phase(), Phase::Running);
        assert_eq!(tracker.active_drivers(), vec![ok]);

        for name in ["a", "b", "c"] {
            tracker.track(event(name));
        }
        tracker.load_drivers().await;
        tracker.flush().await;

        assert_eq!(tracker.pending(), 0);
        assert_eq!(ok_spy.tracked_names(), vec!["a", "b", "c"]);
        assert!(hung_spy.offered().is_empty());
    }
}
