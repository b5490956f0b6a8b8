//! Command implementations, written against [`Store`] so they run the same
//! on `PostgreSQL` and on the in-memory store.

use coursehub_db::{DbError, ObjectHandler, ReadContext, Store, Term, User};
use coursehub_types::{TermName, TermNameParse, UserRole};
use serde::Serialize;
use tracing::{info, warn};

/// Outcome of auditing one stored term name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TermNameStatus {
    /// Satisfies the current rules.
    Canonical,
    /// Accepted only under the legacy rule; should be rewritten.
    Legacy,
    /// Matches no rule; loads as null.
    Unparsable,
    /// Stored as null.
    Missing,
}

/// One audited term row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermAuditEntry {
    /// Row id.
    pub id: i64,
    /// Stored value, verbatim.
    pub stored: Option<String>,
    /// Classification.
    pub status: TermNameStatus,
}

/// Classify every stored term name, in id order.
///
/// Reads raw rows rather than entities: the entity read path folds
/// unparsable values into null, which would hide them here.
pub async fn audit_terms(store: &dyn Store) -> Result<Vec<TermAuditEntry>, DbError> {
    let rows = store.select_all(Term::TABLE).await?;
    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        let id = row.id()?;
        let stored = match row.get("termName") {
            Some(coursehub_db::Value::Text(text)) => text.clone(),
            Some(_) => {
                return Err(DbError::TypeMismatch {
                    attribute: String::from("termName"),
                    expected: "text",
                });
            }
            None => None,
        };
        let status = match stored.as_deref().map(TermName::parse_stored) {
            None => TermNameStatus::Missing,
            Some(TermNameParse::Strict(_)) => TermNameStatus::Canonical,
            Some(TermNameParse::Legacy(_)) => TermNameStatus::Legacy,
            Some(TermNameParse::Failed) => TermNameStatus::Unparsable,
        };
        if matches!(status, TermNameStatus::Legacy | TermNameStatus::Unparsable) {
            warn!(id, stored = stored.as_deref(), ?status, "Term name needs migration");
        }
        entries.push(TermAuditEntry { id, stored, status });
    }
    entries.sort_by_key(|entry| entry.id);
    info!(terms = entries.len(), "Term audit complete");
    Ok(entries)
}

/// Look a user up by e-mail address.
pub async fn find_user(context: ReadContext<'_>, email: &str) -> Result<Option<User>, DbError> {
    ObjectHandler::new(context).get_user_by_mail(email).await
}

/// Every loaded role, ordered by id.
pub fn list_roles(context: ReadContext<'_>) -> Vec<UserRole> {
    context.roles().roles()
}
