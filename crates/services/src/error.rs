//! Shared error types for the services crate.

use thiserror::Error;

use quest_core::model::SceneError;

/// Errors emitted by a `StoryBackend`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BackendError {
    #[error(transparent)]
    Http(reqwest::Error),
    #[error("story backend did not answer in time")]
    Timeout,
    #[error("story backend is unreachable: {0}")]
    Unreachable(String),
    #[error("story backend rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("story backend returned an unreadable response: {0}")]
    Decode(String),
    #[error("story backend returned an invalid scene: {0}")]
    InvalidScene(#[from] SceneError),
    #[error("story backend did not return a session id")]
    MissingSessionId,
    #[error("story backend does not support {0}")]
    Unsupported(&'static str),
}

impl BackendError {
    /// Whether repeating the same request may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            BackendError::Timeout | BackendError::Unreachable(_) => true,
            BackendError::Rejected { status, .. } => (500..600).contains(status),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BackendError::Timeout
        } else if err.is_connect() {
            BackendError::Unreachable(err.to_string())
        } else if err.is_decode() {
            BackendError::Decode(err.to_string())
        } else {
            BackendError::Http(err)
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Decode(err.to_string())
    }
}

/// Errors emitted by `QuestLoopService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuestError {
    #[error("the quest is already finished")]
    Finished,
    #[error("{0:?} is not one of the offered choices")]
    UnknownChoice(String),
    #[error("a choice is already being submitted")]
    TurnInFlight,
    #[error("no turn is waiting for a response")]
    NoPendingTurn,
    #[error("there is no failed turn to retry")]
    NothingToRetry,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl QuestError {
    /// The backend failure behind this error, if any.
    #[must_use]
    pub fn backend(&self) -> Option<&BackendError> {
        match self {
            QuestError::Backend(err) => Some(err),
            _ => None,
        }
    }
}

/// Errors emitted while reading `QuestConfig`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_transient() {
        let err = BackendError::Rejected {
            status: 503,
            message: "busy".into(),
        };
        assert!(err.is_transient());
        assert!(BackendError::Timeout.is_transient());
        assert!(BackendError::Unreachable("refused".into()).is_transient());
    }

    #[test]
    fn client_errors_are_permanent() {
        let err = BackendError::Rejected {
            status: 400,
            message: "bad choice".into(),
        };
        assert!(!err.is_transient());
        assert!(!BackendError::Decode("eof".into()).is_transient());
        assert!(!BackendError::InvalidScene(SceneError::EmptyText).is_transient());
        assert!(!BackendError::MissingSessionId.is_transient());
    }
}
