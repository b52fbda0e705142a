//! Error types shared by the sync and calendar engines.

use std::fmt;

use crate::backend::BackendError;

/// Local invariant violations raised by the engines.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Task not found: {0}")]
    TaskNotFound(i32),

    #[error("List not found: {0}")]
    ListNotFound(String),
}

/// Broad category of a failed operation, for callers deciding how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Network or remote-side failure; retrying later may succeed.
    Transient,
    /// No authenticated identity; the user has to sign in again.
    MissingIdentity,
    /// A referenced record does not exist.
    NotFound,
    /// The local database failed.
    Storage,
}

/// Summary of why an operation failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl SyncFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Classify an error by the first recognised cause in its chain.
    pub fn from_error(err: &anyhow::Error) -> Self {
        let kind = err
            .chain()
            .find_map(|cause| {
                if let Some(backend) = cause.downcast_ref::<BackendError>() {
                    return Some(match backend {
                        BackendError::Auth(_) => FailureKind::MissingIdentity,
                        BackendError::NotFound(_) => FailureKind::NotFound,
                        BackendError::Network(_) | BackendError::InvalidData(_) | BackendError::Other(_) => {
                            FailureKind::Transient
                        }
                    });
                }
                if cause.downcast_ref::<SyncError>().is_some() {
                    return Some(FailureKind::NotFound);
                }
                if cause.downcast_ref::<sea_orm::DbErr>().is_some() {
                    return Some(FailureKind::Storage);
                }
                None
            })
            .unwrap_or(FailureKind::Transient);

        Self::new(kind, format!("{:#}", err))
    }
}

impl fmt::Display for SyncFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_auth_errors_are_missing_identity() {
        let err = anyhow::Error::new(BackendError::Auth("no session".to_string()));
        assert_eq!(SyncFailure::from_error(&err).kind, FailureKind::MissingIdentity);
    }

    #[test]
    fn test_classification_looks_through_context() {
        let result: Result<(), BackendError> = Err(BackendError::Network("timeout".to_string()));
        let err = result.context("Failed to push task 3").unwrap_err();
        let failure = SyncFailure::from_error(&err);

        assert_eq!(failure.kind, FailureKind::Transient);
        assert!(failure.message.contains("Failed to push task 3"));
        assert!(failure.message.contains("timeout"));
    }

    #[test]
    fn test_local_errors() {
        let err = anyhow::Error::new(SyncError::TaskNotFound(7));
        assert_eq!(SyncFailure::from_error(&err).kind, FailureKind::NotFound);

        let err = anyhow::Error::new(sea_orm::DbErr::Custom("disk full".to_string()));
        assert_eq!(SyncFailure::from_error(&err).kind, FailureKind::Storage);

        let err = anyhow::anyhow!("something else");
        assert_eq!(SyncFailure::from_error(&err).kind, FailureKind::Transient);
    }
}
