use std::{borrow::Cow, sync::Arc};

use crate::DriverToken;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Driver {0} not found.")]
    UnknownDriver(DriverToken),

    #[error("Driver {driver} failed to load: {reason}")]
    DriverLoad { driver: Arc<str>, reason: Arc<str> },

    #[error("Driver {driver} declined to load.")]
    DriverDeclined { driver: Arc<str> },

    #[error("Driver {driver} failed to track event '{event}': {source}")]
    DriverTrack {
        driver: Arc<str>,
        event: Cow<'static, str>,
        #[source]
        source: Box<Error>,
    },

    #[error("Driver {driver} panicked while handling event '{event}'")]
    DriverPanicked {
        driver: Arc<str>,
        event: Cow<'static, str>,
    },

    #[error("Event {event} not supported by {driver}!")]
    UnsupportedEvent {
        driver: Arc<str>,
        event: Cow<'static, str>,
    },

    #[error("Custom event {event} is malformed: {reason}")]
    InvalidCustomEvent {
        event: Cow<'static, str>,
        reason: String,
    },

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Drivers have already been loaded; registration is closed.")]
    RegistrationClosed,

    #[error("Error external to Trackify occured: {0}")]
    External(Arc<str>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Wraps any displayable error coming from a driver's own dependencies.
    pub fn external(err: impl std::fmt::Display) -> Self {
        Error::External(Arc::from(err.to_string()))
    }

    /// Variant name, stable across messages. Useful for metrics and tests.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::UnknownDriver(_) => "UnknownDriver",
            Error::DriverLoad { .. } => "DriverLoad",
            Error::DriverDeclined { .. } => "DriverDeclined",
            Error::DriverTrack { .. } => "DriverTrack",
            Error::DriverPanicked { .. } => "DriverPanicked",
            Error::UnsupportedEvent { .. } => "UnsupportedEvent",
            Error::InvalidCustomEvent { .. } => "InvalidCustomEvent",
            Error::InvalidEvent(_) => "InvalidEvent",
            Error::RegistrationClosed => "RegistrationClosed",
            Error::External(_) => "External",
            Error::Json(_) => "Json",
        }
    }

    /// `true` for failures that happened while a driver was being resolved or loaded.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            Error::UnknownDriver(_) | Error::DriverLoad { .. } | Error::DriverDeclined { .. }
        )
    }

    /// `true` for failures that happened while a loaded driver was handling an event.
    pub fn is_track_failure(&self) -> bool {
        matches!(self, Error::DriverTrack { .. } | Error::DriverPanicked { .. })
    }
}
