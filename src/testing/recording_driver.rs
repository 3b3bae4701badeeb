use std::{collections::HashSet, sync::Arc, time::Duration};

use async_trait::async_trait;

use super::{DriverSpy, TrackedEvent};
use crate::{Driver, DriverConstructor, DriverRegistry, DriverToken, Error, Event, Result};

/// What [`RecordingDriver::load`] answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadBehavior {
    #[default]
    Ready,
    Decline,
    Fail,
    Panic,
    /// Never answers.
    Hang,
}

/// What the driver's constructor does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConstructBehavior {
    #[default]
    Succeed,
    Fail,
    Panic,
}

/// What [`RecordingDriver::supports_event`] does after recording the offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SupportsBehavior {
    #[default]
    Answer,
    Panic,
}

/// What [`RecordingDriver::track`] does after recording the attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackBehavior {
    #[default]
    Succeed,
    Fail,
    Panic,
}

/// Configurable driver recording everything it is asked to do.
///
/// Acts as a template: [`constructor`](RecordingDriver::constructor) clones it
/// for every instance, and all clones report to the same [`DriverSpy`].
#[derive(Debug, Clone)]
pub struct RecordingDriver {
    name: Arc<str>,
    construct: ConstructBehavior,
    load: LoadBehavior,
    supports: SupportsBehavior,
    track: TrackBehavior,
    supported: Option<HashSet<String>>,
    delay: Option<Duration>,
    spy: DriverSpy,
}

impl RecordingDriver {
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            construct: ConstructBehavior::default(),
            load: LoadBehavior::default(),
            supports: SupportsBehavior::default(),
            track: TrackBehavior::default(),
            supported: None,
            delay: None,
            spy: DriverSpy::default(),
        }
    }

    pub fn with_construct(mut self, construct: ConstructBehavior) -> Self {
        self.construct = construct;
        self
    }

    pub fn with_supports(mut self, supports: SupportsBehavior) -> Self {
        self.supports = supports;
        self
    }

    pub fn with_load(mut self, load: LoadBehavior) -> Self {
        self.load = load;
        self
    }

    pub fn with_track(mut self, track: TrackBehavior) -> Self {
        self.track = track;
        self
    }

    /// Restrict `supports_event` to the given names. Default: every event.
    pub fn supporting(mut self, names: &[&str]) -> Self {
        self.supported = Some(names.iter().map(|n| n.to_string()).collect());
        self
    }

    /// Sleep inside `track` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn spy(&self) -> DriverSpy {
        self.spy.clone()
    }

    pub fn constructor(&self) -> DriverConstructor {
        let template = self.clone();
        Arc::new(move |_config| {
            template.spy.record_constructed();
            match template.construct {
                ConstructBehavior::Succeed => Ok(Box::new(template.clone()) as Box<dyn Driver>),
                ConstructBehavior::Fail => Err(Error::External(
                    format!("{} rejected its config", template.name).into(),
                )),
                ConstructBehavior::Panic => panic!("{} panicked in constructor", template.name),
            }
        })
    }

    /// Registers this driver under a fresh token named after it.
    pub fn register(self, registry: &mut DriverRegistry) -> (DriverToken, DriverSpy) {
        let token = DriverToken::new(self.name.clone());
        registry.register_constructor(token.clone(), self.constructor());
        (token, self.spy)
    }
}

#[async_trait]
impl Driver for RecordingDriver {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&mut self) -> Result<bool> {
        match self.load {
            LoadBehavior::Ready => {
                self.spy.record_loaded();
                Ok(true)
            }
            LoadBehavior::Decline => Ok(false),
            LoadBehavior::Fail => Err(Error::External("backend unavailable".into())),
            LoadBehavior::Panic => panic!("{} panicked in load", self.name),
            LoadBehavior::Hang => std::future::pending().await,
        }
    }

    fn supports_event(&self, event: &dyn Event) -> bool {
        let name = event.name();
        self.spy.record_offered(&name);
        if self.supports == SupportsBehavior::Panic {
            panic!("{} panicked in supports_event", self.name);
        }
        self.supported
            .as_ref()
            .is_none_or(|names| names.contains(name.as_ref()))
    }

    async fn track(&self, event: &dyn Event) -> Result<()> {
        let name = event.name();
        self.spy.record_attempt(&name);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.track {
            TrackBehavior::Succeed => {
                self.spy.record_tracked(TrackedEvent {
                    name: name.into_owned(),
                    label: event.label().map(str::to_owned),
                    data: event.data(),
                });
                Ok(())
            }
            TrackBehavior::Fail => Err(Error::External(
                format!("{} rejected {}", self.name, name).into(),
            )),
            TrackBehavior::Panic => panic!("{} panicked in track", self.name),
        }
    }
}
