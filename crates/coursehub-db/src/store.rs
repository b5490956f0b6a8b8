//! The backend seam between the object graph and relational storage.
//!
//! Readers only ever need "all rows of a table whose column equals a
//! value". Writers work inside a [`StoreSession`], one transaction that is
//! committed or rolled back as a whole. Both traits are object safe so the
//! rest of the layer works with `&dyn Store`.

use futures::future::BoxFuture;

use crate::error::DbError;
use crate::value::{Row, Value};

/// Read access to tables plus the ability to open a write transaction.
pub trait Store: Send + Sync {
    /// `SELECT * FROM table WHERE column = value`.
    fn select_where<'a>(
        &'a self,
        table: &'a str,
        column: &'a str,
        value: &'a Value,
    ) -> BoxFuture<'a, Result<Vec<Row>, DbError>>;

    /// `SELECT * FROM table`, ordered by id.
    fn select_all<'a>(&'a self, table: &'a str) -> BoxFuture<'a, Result<Vec<Row>, DbError>>;

    /// Open a write transaction.
    fn begin(&self) -> BoxFuture<'_, Result<Box<dyn StoreSession>, DbError>>;
}

/// One write transaction.
///
/// Dropping a session without calling [`StoreSession::commit`] discards
/// its writes.
pub trait StoreSession: Send {
    /// Insert `row` into `table` and return the generated id.
    fn insert<'a>(&'a mut self, table: &'a str, row: &'a Row) -> BoxFuture<'a, Result<i64, DbError>>;

    /// Update the row with `id`, returning the number of rows affected.
    fn update<'a>(
        &'a mut self,
        table: &'a str,
        id: i64,
        row: &'a Row,
    ) -> BoxFuture<'a, Result<u64, DbError>>;

    /// `DELETE FROM table WHERE column = value`, returning rows affected.
    fn delete_where<'a>(
        &'a mut self,
        table: &'a str,
        column: &'a str,
        value: &'a Value,
    ) -> BoxFuture<'a, Result<u64, DbError>>;

    /// Make every write in this session durable.
    fn commit(self: Box<Self>) -> BoxFuture<'static, Result<(), DbError>>;

    /// Discard every write in this session.
    fn rollback(self: Box<Self>) -> BoxFuture<'static, Result<(), DbError>>;
}

/// Reject table and column names that are not plain identifiers.
///
/// Names are spliced into SQL text (values never are), so they are limited
/// to ASCII letters, digits and underscores, not starting with a digit.
pub fn check_identifier(name: &str) -> Result<&str, DbError> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(name)
    } else {
        Err(DbError::InvalidIdentifier(name.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_camel_case_columns() {
        assert!(check_identifier("termId").is_ok());
        assert!(check_identifier("resetPasswordExpire").is_ok());
        assert!(check_identifier("_private").is_ok());
    }

    #[test]
    fn rejects_injection_attempts() {
        for name in ["", "1col", "id; DROP TABLE users", "a\"b", "name-with-dash"] {
            assert!(check_identifier(name).is_err(), "{name} should be rejected");
        }
    }
}
