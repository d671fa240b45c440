//! Error types for storage access and transfer execution.
//!
//! `StoreError` is what a storage engine reports for a single operation.
//! `LedgerError` is what callers of the executor and the transfer service see;
//! it distinguishes where in the scope lifecycle a failure happened.

use std::time::Duration;

use remit_shared::AppError;
use remit_shared::types::AccountId;
use thiserror::Error;

/// Errors reported by a storage engine for a single operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The requested account row does not exist.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// The engine aborted the transaction to preserve isolation
    /// (serialization failure or deadlock victim).
    #[error("Serialization failure: {0}")]
    SerializationFailure(String),

    /// A storage constraint rejected the write.
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// Any other storage failure.
    #[error("Database error: {0}")]
    Database(String),
}

impl StoreError {
    /// Returns true if the whole scope may succeed when run again.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::SerializationFailure(_))
    }
}

/// Coarse classification of a `LedgerError` by lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The storage engine could not open a scope. No work ran.
    ScopeAcquisition,
    /// The request was rejected before any storage interaction.
    Validation,
    /// A step inside the scope failed and the scope was rolled back.
    StepFailure,
    /// A step failed and the rollback failed too.
    RollbackFailure,
    /// Every step succeeded but the commit failed.
    CommitFailure,
}

/// Errors that can occur while executing work inside a transaction scope.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Transfer amount is zero or negative.
    #[error("Transfer amount must be positive, got {0}")]
    InvalidAmount(i64),

    // ========== Step Failures ==========
    /// An account touched by the work does not exist.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Applying the movement would overflow the account balance.
    #[error("Balance overflow on account {account_id}")]
    BalanceOverflow {
        /// The account whose balance would overflow.
        account_id: AccountId,
    },

    /// A storage operation inside the scope failed.
    #[error("Storage step failed: {0}")]
    Store(#[source] StoreError),

    /// The caller cancelled the scope.
    #[error("Transaction cancelled")]
    Cancelled,

    /// The scope ran past its deadline.
    #[error("Transaction exceeded its deadline of {0:?}")]
    TimedOut(Duration),

    // ========== Scope Lifecycle Errors ==========
    /// The storage engine could not open a scope.
    #[error("Failed to begin transaction: {0}")]
    BeginFailed(#[source] StoreError),

    /// All steps succeeded but the commit failed.
    #[error("Failed to commit transaction: {0}")]
    CommitFailed(#[source] StoreError),

    /// A step failed and rolling back failed as well. Both errors are kept
    /// in the message; [`LedgerError::original`] returns the first one.
    #[error("{error}; rollback also failed: {rollback}")]
    RollbackFailed {
        /// The failure that triggered the rollback.
        error: Box<LedgerError>,
        /// The failure reported by the rollback itself.
        rollback: StoreError,
    },
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AccountNotFound(id) => Self::AccountNotFound(id),
            other => Self::Store(other),
        }
    }
}

impl LedgerError {
    /// Returns the lifecycle phase this error belongs to.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAmount(_) => ErrorKind::Validation,
            Self::AccountNotFound(_)
            | Self::BalanceOverflow { .. }
            | Self::Store(_)
            | Self::Cancelled
            | Self::TimedOut(_) => ErrorKind::StepFailure,
            Self::BeginFailed(_) => ErrorKind::ScopeAcquisition,
            Self::CommitFailed(_) => ErrorKind::CommitFailure,
            Self::RollbackFailed { .. } => ErrorKind::RollbackFailure,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::BalanceOverflow { .. } => "BALANCE_OVERFLOW",
            Self::Store(_) => "STORAGE_STEP_FAILED",
            Self::Cancelled => "CANCELLED",
            Self::TimedOut(_) => "TIMED_OUT",
            Self::BeginFailed(_) => "BEGIN_FAILED",
            Self::CommitFailed(_) => "COMMIT_FAILED",
            Self::RollbackFailed { .. } => "ROLLBACK_FAILED",
        }
    }

    /// Returns true if running the whole scope again may succeed.
    ///
    /// The executor never retries on its own; callers decide.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(err) | Self::BeginFailed(err) | Self::CommitFailed(err) => {
                err.is_retryable()
            }
            Self::RollbackFailed { error, .. } => error.is_retryable(),
            _ => false,
        }
    }

    /// Returns the error that caused a rollback, unwrapping `RollbackFailed`.
    #[must_use]
    pub fn original(&self) -> &Self {
        match self {
            Self::RollbackFailed { error, .. } => error.original(),
            other => other,
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err {
            LedgerError::InvalidAmount(_) => Self::Validation(message),
            LedgerError::AccountNotFound(_) => Self::NotFound(message),
            LedgerError::BalanceOverflow { .. } => Self::BusinessRule(message),
            LedgerError::Cancelled | LedgerError::TimedOut(_) => Self::Aborted(message),
            ref retryable if retryable.is_retryable() => Self::Conflict(message),
            LedgerError::Store(_)
            | LedgerError::BeginFailed(_)
            | LedgerError::CommitFailed(_) => Self::Database(message),
            LedgerError::RollbackFailed { .. } => Self::Internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(LedgerError::InvalidAmount(0), ErrorKind::Validation, "INVALID_AMOUNT")]
    #[case(LedgerError::AccountNotFound(AccountId::new()), ErrorKind::StepFailure, "ACCOUNT_NOT_FOUND")]
    #[case(LedgerError::Cancelled, ErrorKind::StepFailure, "CANCELLED")]
    #[case(
        LedgerError::BeginFailed(StoreError::Database("down".into())),
        ErrorKind::ScopeAcquisition,
        "BEGIN_FAILED"
    )]
    #[case(
        LedgerError::CommitFailed(StoreError::Database("lost".into())),
        ErrorKind::CommitFailure,
        "COMMIT_FAILED"
    )]
    fn test_kind_and_code(
        #[case] error: LedgerError,
        #[case] kind: ErrorKind,
        #[case] code: &str,
    ) {
        assert_eq!(error.kind(), kind);
        assert_eq!(error.error_code(), code);
    }

    #[test]
    fn test_store_not_found_maps_to_account_not_found() {
        let id = AccountId::new();
        let err = LedgerError::from(StoreError::AccountNotFound(id));
        assert!(matches!(err, LedgerError::AccountNotFound(found) if found == id));

        let err = LedgerError::from(StoreError::Constraint("fk".into()));
        assert!(matches!(err, LedgerError::Store(StoreError::Constraint(_))));
    }

    #[test]
    fn test_retryable_errors() {
        let serialization = StoreError::SerializationFailure("40001".into());
        assert!(LedgerError::Store(serialization.clone()).is_retryable());
        assert!(LedgerError::CommitFailed(serialization).is_retryable());
        assert!(!LedgerError::Store(StoreError::Database("x".into())).is_retryable());
        assert!(!LedgerError::InvalidAmount(-1).is_retryable());
        assert!(!LedgerError::Cancelled.is_retryable());
    }

    #[test]
    fn test_rollback_failure_keeps_both_errors() {
        let err = LedgerError::RollbackFailed {
            error: Box::new(LedgerError::Store(StoreError::Database("insert".into()))),
            rollback: StoreError::Database("connection reset".into()),
        };

        assert_eq!(
            err.to_string(),
            "Storage step failed: Database error: insert; rollback also failed: Database error: connection reset"
        );
        assert!(matches!(
            err.original(),
            LedgerError::Store(StoreError::Database(msg)) if msg == "insert"
        ));
    }

    #[test]
    fn test_rollback_failure_chain_names_original_once() {
        let err = LedgerError::RollbackFailed {
            error: Box::new(LedgerError::Store(StoreError::Database("insert".into()))),
            rollback: StoreError::Database("connection reset".into()),
        };

        let mut chain = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            chain.push_str(": ");
            chain.push_str(&cause.to_string());
            source = cause.source();
        }

        assert_eq!(chain.matches("Storage step failed").count(), 1);
        assert_eq!(chain.matches("connection reset").count(), 1);
    }

    #[test]
    fn test_rollback_failure_retryable_follows_original() {
        let retryable = LedgerError::RollbackFailed {
            error: Box::new(LedgerError::Store(StoreError::SerializationFailure(
                "40001".into(),
            ))),
            rollback: StoreError::Database("connection reset".into()),
        };
        assert!(retryable.is_retryable());
        assert_eq!(AppError::from(retryable).status_code(), 409);

        let fatal = LedgerError::RollbackFailed {
            error: Box::new(LedgerError::Store(StoreError::Database("insert".into()))),
            rollback: StoreError::SerializationFailure("40001".into()),
        };
        assert!(!fatal.is_retryable());
        assert_eq!(AppError::from(fatal).status_code(), 500);
    }

    #[test]
    fn test_into_app_error() {
        let app: AppError = LedgerError::InvalidAmount(0).into();
        assert_eq!(app.status_code(), 400);

        let app: AppError = LedgerError::AccountNotFound(AccountId::new()).into();
        assert_eq!(app.status_code(), 404);

        let app: AppError =
            LedgerError::Store(StoreError::SerializationFailure("40001".into())).into();
        assert_eq!(app.status_code(), 409);

        let app: AppError = LedgerError::TimedOut(Duration::from_secs(1)).into();
        assert_eq!(app.error_code(), "ABORTED");

        let app: AppError = LedgerError::CommitFailed(StoreError::Database("x".into())).into();
        assert_eq!(app.status_code(), 500);
    }
}
