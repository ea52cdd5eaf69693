//! Error type shared by every public operation.
//!
//! Every failure surfaces as a [`SonifyError`] tagged with one of five
//! [`ErrorKind`]s. Errors that did not originate here keep the original
//! error as their `source()`.

use std::error::Error as StdError;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SonifyError>;

type BoxedCause = Box<dyn StdError + Send + Sync + 'static>;

/// Closed set of failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Input data or configuration was rejected before any work started.
    Validation,
    /// The background worker could not be created, reached, or reported a failure.
    Worker,
    /// The worker did not answer in time. Never retried on the caller thread.
    Timeout,
    /// The output device or an audio buffer could not be created.
    AudioContext,
    /// Anything else.
    Unknown,
}

impl ErrorKind {
    /// Wire code, e.g. `VALIDATION_ERROR`.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::Worker => "WORKER_ERROR",
            ErrorKind::Timeout => "TIMEOUT_ERROR",
            ErrorKind::AudioContext => "AUDIO_CONTEXT_ERROR",
            ErrorKind::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Inverse of [`ErrorKind::code`]. Unrecognized codes map to `Unknown`.
    pub fn from_code(code: &str) -> Self {
        match code {
            "VALIDATION_ERROR" => ErrorKind::Validation,
            "WORKER_ERROR" => ErrorKind::Worker,
            "TIMEOUT_ERROR" => ErrorKind::Timeout,
            "AUDIO_CONTEXT_ERROR" => ErrorKind::AudioContext,
            _ => ErrorKind::Unknown,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A failure from the sonification engine.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct SonifyError {
    kind: ErrorKind,
    message: String,
    field: Option<String>,
    #[source]
    cause: Option<BoxedCause>,
}

impl SonifyError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        SonifyError {
            kind,
            message: message.into(),
            field: None,
            cause: None,
        }
    }

    /// A rejected input or configuration value. `field` names the offender.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        SonifyError {
            field: Some(field.into()),
            ..SonifyError::new(ErrorKind::Validation, message)
        }
    }

    pub fn worker(message: impl Into<String>) -> Self {
        SonifyError::new(ErrorKind::Worker, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        SonifyError::new(ErrorKind::Timeout, message)
    }

    pub fn audio_context(message: impl Into<String>) -> Self {
        SonifyError::new(ErrorKind::AudioContext, message)
    }

    /// Wrap a foreign error, keeping it as the cause.
    pub fn unknown<E>(cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        SonifyError::new(ErrorKind::Unknown, cause.to_string()).with_cause(cause)
    }

    /// Attach an underlying cause.
    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Offending field for validation errors.
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == ErrorKind::Timeout
    }
}

/// A failure reported by a worker across the message boundary.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{name}: {message}")]
pub struct RemoteFault {
    pub message: String,
    pub name: String,
}

impl From<&SonifyError> for RemoteFault {
    fn from(e: &SonifyError) -> Self {
        RemoteFault {
            message: e.message.clone(),
            name: e.kind.code().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for kind in [
            ErrorKind::Validation,
            ErrorKind::Worker,
            ErrorKind::Timeout,
            ErrorKind::AudioContext,
            ErrorKind::Unknown,
        ] {
            assert_eq!(ErrorKind::from_code(kind.code()), kind);
        }
        assert_eq!(ErrorKind::from_code("SOMETHING_ELSE"), ErrorKind::Unknown);
    }

    #[test]
    fn validation_carries_field() {
        let e = SonifyError::validation("sampleRate", "Sample rate must be positive");
        assert_eq!(e.kind(), ErrorKind::Validation);
        assert_eq!(e.field(), Some("sampleRate"));
        assert_eq!(
            e.to_string(),
            "VALIDATION_ERROR: Sample rate must be positive"
        );
        assert!(e.source().is_none());
    }

    #[test]
    fn unknown_keeps_cause() {
        let io = std::io::Error::other("disk on fire");
        let e = SonifyError::unknown(io);
        assert_eq!(e.kind(), ErrorKind::Unknown);
        assert_eq!(e.message(), "disk on fire");
        let cause = e.source().expect("cause should be preserved");
        assert_eq!(cause.to_string(), "disk on fire");
    }

    #[test]
    fn remote_fault_from_error() {
        let e = SonifyError::validation("data", "Data contains a non-finite value at index 3");
        let fault = RemoteFault::from(&e);
        assert_eq!(fault.name, "VALIDATION_ERROR");
        assert_eq!(fault.message, "Data contains a non-finite value at index 3");
    }
}
