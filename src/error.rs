//! Unified error handling for routeranger.
//!
//! One error type covers the whole pipeline: source ingestion, schema
//! rebuild, and the query/write surface. Variants carry enough context to
//! name the offending row or entity in the message.

use thiserror::Error;

/// Unified error type for routeranger operations.
#[derive(Debug, Error)]
pub enum RangerError {
    /// The source file could not be read or a required column is missing.
    #[error("source data error: {0}")]
    Source(#[from] csv::Error),

    /// A bracket-delimited token list did not have the expected shape.
    #[error("trail {trail_id}: column '{column}' is not a bracketed list: {value:?}")]
    ListShape {
        trail_id: i64,
        column: &'static str,
        value: String,
    },

    /// The same trail id appeared on more than one source row.
    #[error("duplicate trail id {trail_id} in source data")]
    DuplicateTrailId { trail_id: i64 },

    /// A difficulty code outside the 1-5 scale.
    #[error("difficulty {difficulty} is out of range (1-5)")]
    InvalidDifficulty { difficulty: i64 },

    /// A trail with this exact name already exists; nothing was written.
    #[error("a trail named '{name}' already exists")]
    DuplicateTrailName { name: String },

    /// An add referenced a park name absent from the dimension table.
    #[error("no park named '{name}'")]
    UnknownPark { name: String },

    /// A proposed change referenced a column that is not editable.
    #[error("field '{field}' is not editable")]
    FieldNotEditable { field: String },

    /// The referenced trail does not exist.
    #[error("no trail with id {trail_id}")]
    TrailNotFound { trail_id: i64 },

    /// The referenced proposed change does not exist or was already resolved.
    #[error("no pending change with id {change_id}")]
    ChangeNotFound { change_id: i64 },

    /// Underlying SQLite failure.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File I/O failure opening the source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for routeranger operations.
pub type Result<T> = std::result::Result<T, RangerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_shape_display_names_row_and_column() {
        let err = RangerError::ListShape {
            trail_id: 42,
            column: "features",
            value: "no brackets".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("42"));
        assert!(msg.contains("features"));
    }

    #[test]
    fn test_duplicate_name_display() {
        let err = RangerError::DuplicateTrailName {
            name: "Angels Landing".to_string(),
        };
        assert!(err.to_string().contains("Angels Landing"));
    }
}
