//! Service-level error: what callers of the recorder, the catalog service and
//! the stock report see.

use thiserror::Error;

use stockroom_auth::AuthzError;
use stockroom_core::DomainError;

use crate::catalog::CatalogError;
use crate::ledger::LedgerError;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// A field failed validation. Never retried.
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// An exit asked for more than the ledger holds. Nothing was appended.
    #[error("insufficient stock: available {available}, requested {requested} (short by {shortfall})")]
    InsufficientStock {
        available: i64,
        requested: i64,
        shortfall: i64,
    },

    #[error("not authenticated")]
    NotAuthenticated,

    #[error("missing permission '{0}'")]
    Unauthorized(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// The item's ledger kept moving under us; retries were exhausted.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// Ledger storage failed. Commits are never retried on storage errors.
    #[error(transparent)]
    Ledger(LedgerError),

    #[error(transparent)]
    Catalog(CatalogError),
}

impl ServiceError {
    /// Field name for `Validation` errors.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation { field, message } => Self::Validation { field, message },
            DomainError::InsufficientStock {
                available,
                requested,
            } => Self::InsufficientStock {
                available,
                requested,
                shortfall: requested - available,
            },
            DomainError::InvariantViolation(msg) => Self::InvariantViolation(msg),
            DomainError::InvalidId(msg) => Self::Validation {
                field: "id",
                message: msg,
            },
            DomainError::NotFound => Self::NotFound("record".to_string()),
            DomainError::Conflict(msg) => Self::Conflict(msg),
        }
    }
}

impl From<AuthzError> for ServiceError {
    fn from(value: AuthzError) -> Self {
        match value {
            AuthzError::NotAuthenticated => Self::NotAuthenticated,
            AuthzError::Forbidden(permission) => Self::Unauthorized(permission),
        }
    }
}

impl From<LedgerError> for ServiceError {
    fn from(value: LedgerError) -> Self {
        match value {
            LedgerError::Concurrency(msg) => Self::Conflict(msg),
            LedgerError::NotFound(id) => Self::NotFound(format!("movement {id}")),
            other => Self::Ledger(other),
        }
    }
}

impl From<CatalogError> for ServiceError {
    fn from(value: CatalogError) -> Self {
        match value {
            CatalogError::NotFound { kind, id } => Self::NotFound(format!("{kind} {id}")),
            other => Self::Catalog(other),
        }
    }
}
