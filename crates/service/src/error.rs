use std::time::Duration;

use domain::ValidationError;
use storage::StoreError;
use thiserror::Error;

/// Errors returned by the services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The caller supplied invalid input.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: String },

    /// Beginning, committing or rolling back failed.
    #[error("Transaction error: {0}")]
    Transaction(#[source] StoreError),

    /// The transaction did not finish in time and was rolled back.
    #[error("Transaction timed out after {0:?}")]
    Timeout(Duration),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[source] StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Validation(e) => ServiceError::Validation(e),
            StoreError::NotFound { entity, id } => ServiceError::NotFound { entity, id },
            StoreError::AlreadyExists { entity, id } => ServiceError::AlreadyExists { entity, id },
            StoreError::Serialization(e) => ServiceError::Serialization(e),
            e @ StoreError::Transaction { .. } => ServiceError::Transaction(e),
            e => ServiceError::Storage(e),
        }
    }
}

impl ServiceError {
    /// Returns true for errors caused by the caller rather than the system.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServiceError::Validation(_)
                | ServiceError::NotFound { .. }
                | ServiceError::AlreadyExists { .. }
        )
    }
}

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use storage::TxStage;

    #[test]
    fn store_errors_map_into_taxonomy() {
        let not_found: ServiceError = StoreError::order_not_found("o1").into();
        assert!(matches!(
            not_found,
            ServiceError::NotFound { entity: "order", .. }
        ));

        let tx: ServiceError = StoreError::Transaction {
            stage: TxStage::Begin,
            source: sqlx::Error::PoolTimedOut,
        }
        .into();
        assert!(matches!(tx, ServiceError::Transaction(_)));
        assert!(!tx.is_client_error());

        let db: ServiceError = StoreError::Database(sqlx::Error::PoolTimedOut).into();
        assert!(matches!(db, ServiceError::Storage(_)));

        let invalid: ServiceError = StoreError::from(ValidationError::TotalOverflow).into();
        assert!(matches!(
            invalid,
            ServiceError::Validation(ValidationError::TotalOverflow)
        ));
        assert!(invalid.is_client_error());
    }

    #[test]
    fn validation_message_is_passed_through() {
        let err = ServiceError::from(ValidationError::CustomerIdRequired);
        assert_eq!(err.to_string(), "customer_id is required");
        assert!(err.is_client_error());
    }
}
