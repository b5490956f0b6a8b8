//! Lookups by id and natural key.
//!
//! Each lookup runs one single-table query and hands the first matching row
//! to a [`DatabaseResultSetReader`]. No match is `Ok(None)`.

use coursehub_types::{CourseId, Email, ProjectId, TermId, TermName, UserId};
use tracing::debug;

use crate::entities::{Course, Project, Term, User};
use crate::error::DbError;
use crate::reader::{DatabaseResultSetReader, ReadContext};
use crate::serializable::Serializable;
use crate::value::Value;

/// Convenience façade over the reader.
#[derive(Debug, Clone, Copy)]
pub struct ObjectHandler<'s> {
    context: ReadContext<'s>,
}

impl<'s> ObjectHandler<'s> {
    /// Create a handler reading through `context`.
    pub const fn new(context: ReadContext<'s>) -> Self {
        Self { context }
    }

    async fn find_one<T>(&self, table: &str, column: &str, value: Value) -> Result<Option<T>, DbError>
    where
        T: Serializable + Default,
    {
        let rows = self
            .context
            .store()
            .select_where(table, column, &value)
            .await?;
        if rows.len() > 1 {
            debug!(table, column, matches = rows.len(), "Lookup matched several rows; using the first");
        }
        match rows.into_iter().next() {
            Some(row) => Ok(Some(
                DatabaseResultSetReader::new(row, self.context)
                    .read_root()
                    .await?,
            )),
            None => Ok(None),
        }
    }

    /// Load a user by id.
    pub async fn get_user(&self, id: UserId) -> Result<Option<User>, DbError> {
        self.find_one(User::TABLE, "id", Value::from(id.into_inner()))
            .await
    }

    /// Load a user by e-mail address.
    ///
    /// The trimmed input is matched as written first, so rows stored before
    /// validation stay reachable. If that misses, the normalized form of a
    /// valid address is tried.
    pub async fn get_user_by_mail(&self, email: &str) -> Result<Option<User>, DbError> {
        let raw = email.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        if let Some(user) = self
            .find_one(User::TABLE, User::EMAIL_COLUMN, Value::from(raw))
            .await?
        {
            return Ok(Some(user));
        }
        match Email::parse(raw) {
            Ok(normalized) if normalized.as_str() != raw => {
                self.find_one(User::TABLE, User::EMAIL_COLUMN, Value::from(normalized.as_str()))
                    .await
            }
            _ => Ok(None),
        }
    }

    /// Load a term, its courses and their projects by id.
    pub async fn get_term(&self, id: TermId) -> Result<Option<Term>, DbError> {
        self.find_one(Term::TABLE, "id", Value::from(id.into_inner()))
            .await
    }

    /// Load a term by its canonical name.
    pub async fn get_term_by_name(&self, name: &TermName) -> Result<Option<Term>, DbError> {
        let name = name.to_string();
        self.find_one(Term::TABLE, "termName", Value::from(name.as_str()))
            .await
    }

    /// Load a course and its projects by id.
    pub async fn get_course(&self, id: CourseId) -> Result<Option<Course>, DbError> {
        self.find_one(Course::TABLE, "id", Value::from(id.into_inner()))
            .await
    }

    /// Load a project by id.
    pub async fn get_project(&self, id: ProjectId) -> Result<Option<Project>, DbError> {
        self.find_one(Project::TABLE, "id", Value::from(id.into_inner()))
            .await
    }

    /// Load every term with its full graph, ordered by id.
    pub async fn get_all_terms(&self) -> Result<Vec<Term>, DbError> {
        let rows = self.context.store().select_all(Term::TABLE).await?;
        let mut terms = Vec::with_capacity(rows.len());
        for row in rows {
            terms.push(
                DatabaseResultSetReader::new(row, self.context)
                    .read_root::<Term>()
                    .await?,
            );
        }
        terms.sort_by_key(Term::id);
        Ok(terms)
    }
}
