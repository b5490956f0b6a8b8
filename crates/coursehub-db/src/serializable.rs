//! The contract between entities and storage.
//!
//! An entity never talks to the database. It implements [`Serializable`]
//! and moves named attributes through a [`Writer`] (scalars only) or a
//! [`Reader`] (scalars plus requests for owned collections). Whoever drives
//! the reader or writer decides what a "row" is and how children are
//! fetched or cascaded.

use chrono::{DateTime, Utc};
use coursehub_types::{Email, RoleRegistry, TermName, TermNameParse};
use futures::future::BoxFuture;

use crate::entities::Entity;
use crate::error::DbError;
use crate::value::{Row, Value};

/// Sink for an entity's scalar attributes.
pub trait Writer {
    /// Write a text attribute.
    fn write_string(&mut self, attribute: &str, value: Option<&str>);
    /// Write an integer attribute.
    fn write_number(&mut self, attribute: &str, value: Option<i64>);
    /// Write a boolean attribute.
    fn write_bool(&mut self, attribute: &str, value: Option<bool>);
    /// Write a timestamp attribute.
    fn write_date_time(&mut self, attribute: &str, value: Option<DateTime<Utc>>);
}

/// A [`Writer`] that collects attributes into a [`Row`].
#[derive(Debug, Default)]
pub struct RowWriter {
    row: Row,
}

impl RowWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// The collected attributes.
    pub fn into_row(self) -> Row {
        self.row
    }
}

impl Writer for RowWriter {
    fn write_string(&mut self, attribute: &str, value: Option<&str>) {
        self.row.set(attribute, Value::Text(value.map(str::to_owned)));
    }

    fn write_number(&mut self, attribute: &str, value: Option<i64>) {
        self.row.set(attribute, Value::Number(value));
    }

    fn write_bool(&mut self, attribute: &str, value: Option<bool>) {
        self.row.set(attribute, Value::Bool(value));
    }

    fn write_date_time(&mut self, attribute: &str, value: Option<DateTime<Utc>>) {
        self.row.set(attribute, Value::DateTime(value));
    }
}

fn mismatch(attribute: &str, expected: &'static str) -> DbError {
    DbError::TypeMismatch {
        attribute: attribute.to_owned(),
        expected,
    }
}

/// Source of an entity's attributes and owned collections.
///
/// A missing attribute reads as `None`. Reading an attribute as the wrong
/// kind is a structural error.
pub trait Reader: Send {
    /// Table the current row came from.
    fn table(&self) -> &str;

    /// Identity of the current row.
    fn id(&self) -> i64;

    /// Raw access to an attribute of the current row.
    fn read_value(&self, attribute: &str) -> Option<&Value>;

    /// Registry used to resolve role ids.
    fn role_registry(&self) -> &RoleRegistry;

    /// Load the single entity of type `type_name` whose id is stored in
    /// `attribute`, or `None` if the attribute is null or dangling.
    fn read_object<'a>(
        &'a mut self,
        attribute: &'a str,
        type_name: &'a str,
    ) -> BoxFuture<'a, Result<Option<Entity>, DbError>>;

    /// Load every entity of type `type_name` whose `foreign_key` column
    /// equals the current row's id, each fully hydrated.
    fn read_objects<'a>(
        &'a mut self,
        foreign_key: &'a str,
        type_name: &'a str,
    ) -> BoxFuture<'a, Result<Vec<Entity>, DbError>>;

    /// Read a text attribute.
    fn read_string(&self, attribute: &str) -> Result<Option<String>, DbError> {
        match self.read_value(attribute) {
            Some(Value::Text(Some(text))) => Ok(Some(text.clone())),
            Some(value) if !value.is_null() => Err(mismatch(attribute, "text")),
            _ => Ok(None),
        }
    }

    /// Read an integer attribute.
    fn read_number(&self, attribute: &str) -> Result<Option<i64>, DbError> {
        match self.read_value(attribute) {
            Some(Value::Number(Some(number))) => Ok(Some(*number)),
            Some(value) if !value.is_null() => Err(mismatch(attribute, "number")),
            _ => Ok(None),
        }
    }

    /// Read a boolean attribute.
    fn read_bool(&self, attribute: &str) -> Result<Option<bool>, DbError> {
        match self.read_value(attribute) {
            Some(Value::Bool(Some(flag))) => Ok(Some(*flag)),
            Some(value) if !value.is_null() => Err(mismatch(attribute, "bool")),
            _ => Ok(None),
        }
    }

    /// Read a timestamp attribute.
    fn read_date_time(&self, attribute: &str) -> Result<Option<DateTime<Utc>>, DbError> {
        match self.read_value(attribute) {
            Some(Value::DateTime(Some(at))) => Ok(Some(*at)),
            Some(value) if !value.is_null() => Err(mismatch(attribute, "datetime")),
            _ => Ok(None),
        }
    }

    /// Read a term name, tolerating values written under older rules.
    ///
    /// Strict parse first, then the legacy rule (logged as a migration
    /// candidate), and a value that fits neither loads as `None` with a
    /// warning. Validation never fails the read.
    fn read_term_name(&self, attribute: &str) -> Result<Option<TermName>, DbError> {
        let Some(stored) = self.read_string(attribute)? else {
            return Ok(None);
        };
        match TermName::parse_stored(&stored) {
            TermNameParse::Strict(name) => Ok(Some(name)),
            TermNameParse::Legacy(name) => {
                tracing::warn!(
                    table = self.table(),
                    id = self.id(),
                    attribute,
                    stored = stored.as_str(),
                    "Loaded legacy term name; row is a migration candidate"
                );
                Ok(Some(name))
            }
            TermNameParse::Failed => {
                tracing::warn!(
                    table = self.table(),
                    id = self.id(),
                    attribute,
                    stored = stored.as_str(),
                    "Unparsable term name; loading as null"
                );
                Ok(None)
            }
        }
    }

    /// Read an e-mail address. The stored text is kept verbatim, including
    /// addresses that are not in normalized form or fail validation.
    fn read_email(&self, attribute: &str) -> Result<Option<Email>, DbError> {
        let Some(stored) = self.read_string(attribute)? else {
            return Ok(None);
        };
        match Email::parse(&stored) {
            Ok(email) if email.as_str() == stored => Ok(Some(email)),
            Ok(_) => Ok(Some(Email::from_stored_unchecked(stored))),
            Err(err) => {
                tracing::warn!(
                    table = self.table(),
                    id = self.id(),
                    attribute,
                    error = %err,
                    "Stored e-mail address fails validation; keeping it unchanged"
                );
                Ok(Some(Email::from_stored_unchecked(stored)))
            }
        }
    }
}

/// An aggregate that can be moved to and from storage.
///
/// [`Serializable::write_to`] writes the entity's own scalar attributes
/// only. Owned collections are cascaded by the database writer.
pub trait Serializable: Send + Sync {
    /// Name the factory knows this type by, e.g. `Term`.
    fn type_name(&self) -> &'static str;

    /// Table the entity's own row lives in.
    fn table(&self) -> &'static str;

    /// Storage identity; `0` until first written.
    fn id(&self) -> i64;

    /// Assign the storage identity.
    fn set_id(&mut self, id: i64);

    /// Populate the entity from `reader`, including owned collections.
    fn read_from<'a>(&'a mut self, reader: &'a mut dyn Reader) -> BoxFuture<'a, Result<(), DbError>>;

    /// Emit the entity's scalar attributes.
    fn write_to(&self, writer: &mut dyn Writer);
}
