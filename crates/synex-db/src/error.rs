//! Database-specific error types and conversions.

use synex_core::error::SynexError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Malformed record: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Unique constraint violated: {entity} '{key}'")]
    AlreadyExists { entity: String, key: String },
}

impl DbError {
    /// Classify a failed statement, surfacing unique-index violations as
    /// [`DbError::AlreadyExists`].
    pub(crate) fn on_write(err: surrealdb::Error, entity: &str, key: &str) -> Self {
        classify(vec![err.to_string()], entity, key)
    }

    /// Classify the statement errors of a transactional batch. A duplicate
    /// record id or unique-index entry in any statement makes the whole
    /// batch [`DbError::AlreadyExists`].
    pub(crate) fn on_batch_write(
        errors: impl IntoIterator<Item = surrealdb::Error>,
        entity: &str,
        key: &str,
    ) -> Self {
        classify(errors.into_iter().map(|e| e.to_string()).collect(), entity, key)
    }
}

fn classify(messages: Vec<String>, entity: &str, key: &str) -> DbError {
    let duplicate = messages
        .iter()
        .any(|m| m.contains("already contains") || m.contains("already exists"));
    if duplicate {
        DbError::AlreadyExists {
            entity: entity.into(),
            key: key.into(),
        }
    } else {
        DbError::Query(messages.join("; "))
    }
}

impl From<DbError> for SynexError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => SynexError::NotFound { entity, id },
            DbError::AlreadyExists { entity, key } => SynexError::AlreadyExists { entity, key },
            other => SynexError::Database(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_keeps_its_kind() {
        let err: SynexError = DbError::NotFound {
            entity: "role".into(),
            id: "abc".into(),
        }
        .into();
        assert!(matches!(err, SynexError::NotFound { .. }));
    }

    #[test]
    fn duplicate_record_anywhere_in_a_batch_is_already_exists() {
        let err = classify(
            vec![
                "The query was not executed due to a cancelled transaction".into(),
                "Database record `permission_name:ORDER_SHIP` already exists".into(),
            ],
            "permission",
            "ORDER_SHIP",
        );
        assert!(matches!(err, DbError::AlreadyExists { ref key, .. } if key == "ORDER_SHIP"));
    }

    #[test]
    fn other_batch_failures_stay_query_errors() {
        let err = classify(vec!["boom".into(), "bang".into()], "permission", "X");
        assert!(matches!(err, DbError::Query(ref m) if m == "boom; bang"));
    }

    #[test]
    fn query_failures_become_store_errors() {
        let err: SynexError = DbError::Query("boom".into()).into();
        assert!(err.is_store_error());
    }
}
