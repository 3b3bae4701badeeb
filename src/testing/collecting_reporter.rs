use std::sync::{Arc, Mutex, PoisonError};

use crate::{Error, ErrorReporter};

/// One error captured by a [`CollectingReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedError {
    pub kind: &'static str,
    pub message: String,
}

/// Reporter that keeps every error in memory. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct CollectingReporter {
    errors: Arc<Mutex<Vec<ReportedError>>>,
}

impl CollectingReporter {
    pub fn errors(&self) -> Vec<ReportedError> {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.errors().into_iter().map(|e| e.kind).collect()
    }

    pub fn count_of(&self, kind: &str) -> usize {
        self.errors().iter().filter(|e| e.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ErrorReporter for CollectingReporter {
    fn report(&self, error: &Error) {
        let mut message = error.to_string();
        if let Some(source) = std::error::Error::source(error) {
            message.push_str(" <- ");
            message.push_str(&source.to_string());
        }
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ReportedError {
                kind: error.kind(),
                message,
            });
    }
}
