//! The module contains the error the ledger can throw.
//!
//! Every variant except [`Storage`] describes a rejected request; the input
//! was invalid and retrying it unchanged cannot succeed. [`Storage`] wraps
//! the database driver error and is the only class that can be transient.
//!
//!  [`Storage`]: LedgerError::Storage
use sea_orm::DbErr;
use thiserror::Error;

/// Ledger custom errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),
    #[error("Invalid transfer: {0}")]
    InvalidTransfer(String),
    #[error("Invalid wallet: {0}")]
    InvalidWallet(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingName(String),
    #[error("Currency mismatch: {0}")]
    CurrencyMismatch(String),
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error(transparent)]
    Storage(#[from] DbErr),
}

impl LedgerError {
    /// Whether retrying the same request may succeed.
    ///
    /// True only for connection-class storage failures; every validation
    /// error is deterministic.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Storage(DbErr::Conn(_) | DbErr::ConnectionAcquire(_))
        )
    }
}

impl PartialEq for LedgerError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidTransaction(a), Self::InvalidTransaction(b)) => a == b,
            (Self::InvalidTransfer(a), Self::InvalidTransfer(b)) => a == b,
            (Self::InvalidWallet(a), Self::InvalidWallet(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingName(a), Self::ExistingName(b)) => a == b,
            (Self::CurrencyMismatch(a), Self::CurrencyMismatch(b)) => a == b,
            (Self::InvalidCursor(a), Self::InvalidCursor(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::Storage(a), Self::Storage(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_connection_failures_are_retryable() {
        assert!(
            LedgerError::Storage(DbErr::Conn(sea_orm::RuntimeErr::Internal(
                "connection refused".to_string()
            )))
            .is_retryable()
        );
        assert!(!LedgerError::Storage(DbErr::RecordNotInserted).is_retryable());
        assert!(!LedgerError::InvalidAmount("zero".to_string()).is_retryable());
        assert!(!LedgerError::KeyNotFound("wallet".to_string()).is_retryable());
    }
}
