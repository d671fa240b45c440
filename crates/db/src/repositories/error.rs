//! Error type shared by the repositories.

use remit_shared::AppError;
use remit_shared::types::InvalidCurrencyCode;
use sea_orm::DbErr;
use uuid::Uuid;

/// Error types for repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Row not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Table the lookup ran against.
        entity: &'static str,
        /// Requested primary key.
        id: Uuid,
    },

    /// Cannot delete an account still referenced by ledger rows.
    #[error("Cannot delete account: account has {0} ledger rows")]
    AccountInUse(u64),

    /// A stored currency code failed to parse.
    #[error(transparent)]
    InvalidCurrency(#[from] InvalidCurrencyCode),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { .. } => Self::NotFound(err.to_string()),
            RepositoryError::AccountInUse(_) => Self::Conflict(err.to_string()),
            RepositoryError::InvalidCurrency(_) => Self::Internal(err.to_string()),
            RepositoryError::Database(_) => Self::Database(err.to_string()),
        }
    }
}
