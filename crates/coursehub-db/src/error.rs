//! Error types for the persistence layer.
//!
//! All errors are propagated via [`DbError`], which wraps the underlying
//! [`sqlx`] errors and the domain errors raised while hydrating entities.
//! Absence of a row is never an error here; lookups return `Option`.

use coursehub_types::DomainError;

/// Errors that can occur in the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A value type or registry rejected its input.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// The factory has no constructor registered under this name.
    #[error("unknown entity type: {0:?}")]
    UnknownEntityType(String),

    /// An entity of one type was found where another was required.
    #[error("expected a {expected} entity, found {found}")]
    UnexpectedEntity {
        /// Type the caller asked for.
        expected: &'static str,
        /// Type that was produced.
        found: &'static str,
    },

    /// An UPDATE matched no row.
    #[error("no row with id {id} in table {table}")]
    RowNotFound {
        /// Table that was updated.
        table: String,
        /// Identity that was not found.
        id: i64,
    },

    /// A child entity was written on its own without a parent to belong to.
    #[error("{table} row needs a parent: {column} is not set")]
    MissingParent {
        /// Table of the child row.
        table: &'static str,
        /// Foreign-key column that is unset.
        column: &'static str,
    },

    /// A row does not carry an attribute the entity needs.
    #[error("row has no attribute {0:?}")]
    MissingAttribute(String),

    /// An attribute holds a different kind of value than requested.
    #[error("attribute {attribute:?} is not a {expected} value")]
    TypeMismatch {
        /// Attribute that was read.
        attribute: String,
        /// Kind of value the reader asked for.
        expected: &'static str,
    },

    /// A table or column name is not a plain identifier.
    #[error("invalid SQL identifier: {0:?}")]
    InvalidIdentifier(String),

    /// The database returned a column type the layer does not map.
    #[error("unsupported column type {type_name} for column {column:?}")]
    UnsupportedColumnType {
        /// Column name.
        column: String,
        /// Database type name.
        type_name: String,
    },

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_error_converts() {
        let err = DbError::from(DomainError::illegal("role registry has not been loaded"));
        assert!(err.to_string().contains("not been loaded"));
    }

    #[test]
    fn row_not_found_names_table_and_id() {
        let err = DbError::RowNotFound {
            table: String::from("terms"),
            id: 4,
        };
        assert_eq!(err.to_string(), "no row with id 4 in table terms");
    }

    #[test]
    fn missing_parent_names_the_foreign_key() {
        let err = DbError::MissingParent {
            table: "projects",
            column: "courseId",
        };
        assert_eq!(err.to_string(), "projects row needs a parent: courseId is not set");
    }
}
