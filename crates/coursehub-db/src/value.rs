//! Storage-neutral scalar values and rows.
//!
//! Every [`Value`] carries its kind even when it is `NULL`, so a backend can
//! bind a typed null parameter instead of guessing a column type.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::error::DbError;

/// A nullable scalar attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Text column.
    Text(Option<String>),
    /// Integer column (ids, foreign keys, counters).
    Number(Option<i64>),
    /// Boolean column.
    Bool(Option<bool>),
    /// Timestamp column, always UTC.
    DateTime(Option<DateTime<Utc>>),
}

impl Value {
    /// Whether the value is a (typed) `NULL`.
    pub const fn is_null(&self) -> bool {
        matches!(
            self,
            Self::Text(None) | Self::Number(None) | Self::Bool(None) | Self::DateTime(None)
        )
    }

    /// Name of the value kind, used in error messages.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Number(_) => "number",
            Self::Bool(_) => "bool",
            Self::DateTime(_) => "datetime",
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(Some(value.to_owned()))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Number(Some(value))
    }
}

/// One row: attribute (column) name to value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    values: BTreeMap<String, Value>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute, replacing any previous value.
    pub fn set(&mut self, attribute: impl Into<String>, value: Value) {
        self.values.insert(attribute.into(), value);
    }

    /// Builder-style [`Row::set`].
    #[must_use]
    pub fn with(mut self, attribute: impl Into<String>, value: Value) -> Self {
        self.set(attribute, value);
        self
    }

    /// Look up an attribute.
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.values.get(attribute)
    }

    /// Remove an attribute, returning its value.
    pub fn remove(&mut self, attribute: &str) -> Option<Value> {
        self.values.remove(attribute)
    }

    /// Iterate over attributes in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row has no attributes.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The row's `id` attribute.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::MissingAttribute`] if there is no non-null `id`,
    /// or [`DbError::TypeMismatch`] if it is not a number.
    pub fn id(&self) -> Result<i64, DbError> {
        match self.get("id") {
            Some(Value::Number(Some(id))) => Ok(*id),
            Some(Value::Number(None)) | None => Err(DbError::MissingAttribute(String::from("id"))),
            Some(_) => Err(DbError::TypeMismatch {
                attribute: String::from("id"),
                expected: "number",
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn typed_nulls_keep_their_kind() {
        let value = Value::Number(None);
        assert!(value.is_null());
        assert_eq!(value.kind(), "number");
        assert_ne!(Value::Number(None), Value::Text(None));
    }

    #[test]
    fn row_id_requires_number() {
        let row = Row::new().with("id", Value::from(3));
        assert_eq!(row.id().unwrap(), 3);

        let text_id = Row::new().with("id", Value::from("3"));
        assert!(matches!(text_id.id(), Err(DbError::TypeMismatch { .. })));

        assert!(matches!(Row::new().id(), Err(DbError::MissingAttribute(_))));
    }

    #[test]
    fn iteration_is_name_ordered() {
        let row = Row::new()
            .with("termName", Value::from("WS2024"))
            .with("displayName", Value::Text(None));
        let names: Vec<&str> = row.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["displayName", "termName"]);
    }
}
