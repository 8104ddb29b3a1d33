//! Service-level error types.
//!
//! Errors are classified by how the web layer should surface them:
//! - NotFound: the referenced record is absent or owned by another account (404)
//! - Validation: malformed caller input (400)
//! - Db: the record store failed (5xx)
//!
//! Nothing here retries; failures propagate to the request boundary.

use thiserror::Error;

use crate::db::DbError;

#[derive(Debug, Error)]
pub enum CrmError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Db(DbError),
}

impl CrmError {
    /// Convenience constructor for missing or foreign-owned records.
    pub fn not_found(what: impl Into<String>) -> Self {
        CrmError::NotFound(what.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CrmError::NotFound(_))
    }

    /// Equivalent HTTP status for the web layer to map onto.
    pub fn status_code(&self) -> u16 {
        match self {
            CrmError::NotFound(_) => 404,
            CrmError::Validation(_) => 400,
            CrmError::Db(_) => 500,
        }
    }
}

impl From<DbError> for CrmError {
    fn from(err: DbError) -> Self {
        match err {
            // Domain validation surfaced by the store (phone format, bad JSON
            // blobs) is caller error, not a store failure.
            DbError::Invalid(msg) => CrmError::Validation(msg),
            other => CrmError::Db(other),
        }
    }
}

/// Serializable error representation for the JSON boundary.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub message: String,
    pub error_type: ErrorType,
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    NotFound,
    Validation,
    StoreUnavailable,
}

impl From<&CrmError> for ApiError {
    fn from(err: &CrmError) -> Self {
        let error_type = match err {
            CrmError::NotFound(_) => ErrorType::NotFound,
            CrmError::Validation(_) => ErrorType::Validation,
            CrmError::Db(_) => ErrorType::StoreUnavailable,
        };
        ApiError {
            message: err.to_string(),
            error_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(CrmError::not_found("Widget").status_code(), 404);
        assert_eq!(CrmError::Validation("bad days".into()).status_code(), 400);
        assert_eq!(
            CrmError::Db(DbError::Migration("boom".into())).status_code(),
            500
        );
    }

    #[test]
    fn test_store_validation_maps_to_validation() {
        let err: CrmError = DbError::Invalid("bad phone".to_string()).into();
        assert_eq!(err.status_code(), 400);

        let api = ApiError::from(&err);
        assert!(matches!(api.error_type, ErrorType::Validation));
        assert!(api.message.contains("bad phone"));
    }
}
