use domain::ValidationError;
use thiserror::Error;

/// The transaction step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStage {
    Begin,
    Commit,
    Rollback,
}

impl std::fmt::Display for TxStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TxStage::Begin => f.write_str("begin"),
            TxStage::Commit => f.write_str("commit"),
            TxStage::Rollback => f.write_str("roll back"),
        }
    }
}

/// Errors that can occur when interacting with a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested row does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The row to insert failed domain validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A row with the same primary key already exists.
    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: String },

    /// Opening, committing or rolling back a transaction failed.
    #[error("Failed to {stage} transaction: {source}")]
    Transaction {
        stage: TxStage,
        #[source]
        source: sqlx::Error,
    },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn order_not_found(id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity: "order",
            id: id.into(),
        }
    }

    pub fn product_not_found(id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity: "product",
            id: id.into(),
        }
    }

    /// Maps a unique-key violation to `AlreadyExists` and anything else to
    /// `Database`.
    pub(crate) fn on_insert(
        entity: &'static str,
        id: impl Into<String>,
    ) -> impl FnOnce(sqlx::Error) -> Self {
        let id = id.into();
        move |e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                StoreError::AlreadyExists { entity, id }
            }
            e => StoreError::Database(e),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub(crate) fn at(stage: TxStage) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| StoreError::Transaction { stage, source }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_entity() {
        let err = StoreError::order_not_found("o-1");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "order not found: o-1");
    }

    #[test]
    fn transaction_message_names_stage() {
        let err = StoreError::at(TxStage::Commit)(sqlx::Error::PoolTimedOut);
        assert!(err.to_string().starts_with("Failed to commit transaction"));
        assert!(!err.is_not_found());
    }
}
