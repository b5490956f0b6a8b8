//! Persist aggregates, children included, in one transaction.
//!
//! Each aggregate type spells out its own cascade in [`Persist`]: write the
//! parent row, learn its id, point every child's foreign key at it, write
//! the children. Children detached since the last load are deleted in the
//! same transaction.
//!
//! [`DatabaseWriter::write_root`] cascades into a clone of the caller's
//! entity and copies it back only after the commit succeeds. A failed write
//! leaves the caller's entity exactly as it was, with no half-assigned ids.

use coursehub_types::CourseId;
use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::{debug, error, info, warn};

use crate::entities::{Course, Entity, Project, Term, User};
use crate::error::DbError;
use crate::serializable::{RowWriter, Serializable};
use crate::store::{Store, StoreSession};
use crate::value::Value;

/// An aggregate that knows how to cascade its writes and deletes.
pub trait Persist: Serializable + Clone {
    /// Insert or update this entity and everything it owns.
    fn cascade_write<'a>(
        &'a mut self,
        session: &'a mut dyn StoreSession,
    ) -> BoxFuture<'a, Result<(), DbError>>;

    /// Delete this entity and everything it owns.
    fn cascade_delete<'a>(
        &'a self,
        session: &'a mut dyn StoreSession,
    ) -> BoxFuture<'a, Result<(), DbError>>;
}

/// Insert (unset id) or update (set id) the entity's own row.
async fn write_scalars(
    entity: &mut dyn Serializable,
    session: &mut dyn StoreSession,
) -> Result<(), DbError> {
    let mut writer = RowWriter::new();
    entity.write_to(&mut writer);
    let mut row = writer.into_row();
    row.remove("id");

    let table = entity.table();
    let id = entity.id();
    if id == 0 {
        let id = session.insert(table, &row).await?;
        entity.set_id(id);
        debug!(table, id, "Inserted row");
    } else {
        let affected = session.update(table, id, &row).await?;
        if affected == 0 {
            return Err(DbError::RowNotFound {
                table: table.to_owned(),
                id,
            });
        }
        debug!(table, id, "Updated row");
    }
    Ok(())
}

/// Refuse to write a child row whose foreign key points nowhere.
const fn require_parent(
    parent_id: i64,
    table: &'static str,
    column: &'static str,
) -> Result<(), DbError> {
    if parent_id == 0 {
        Err(DbError::MissingParent { table, column })
    } else {
        Ok(())
    }
}

async fn delete_by_id(
    session: &mut dyn StoreSession,
    table: &str,
    id: i64,
) -> Result<(), DbError> {
    let deleted = session.delete_where(table, "id", &Value::from(id)).await?;
    debug!(table, id, deleted, "Deleted row");
    Ok(())
}

async fn delete_course_rows(session: &mut dyn StoreSession, id: CourseId) -> Result<(), DbError> {
    let course_id = Value::from(id.into_inner());
    session
        .delete_where(Project::TABLE, Project::COURSE_FK, &course_id)
        .await?;
    delete_by_id(session, Course::TABLE, id.into_inner()).await
}

impl Persist for User {
    fn cascade_write<'a>(
        &'a mut self,
        session: &'a mut dyn StoreSession,
    ) -> BoxFuture<'a, Result<(), DbError>> {
        write_scalars(self, session).boxed()
    }

    fn cascade_delete<'a>(
        &'a self,
        session: &'a mut dyn StoreSession,
    ) -> BoxFuture<'a, Result<(), DbError>> {
        async move {
            if !self.id().is_unset() {
                delete_by_id(session, Self::TABLE, self.id().into_inner()).await?;
            }
            Ok(())
        }
        .boxed()
    }
}

impl Persist for Project {
    fn cascade_write<'a>(
        &'a mut self,
        session: &'a mut dyn StoreSession,
    ) -> BoxFuture<'a, Result<(), DbError>> {
        async move {
            require_parent(self.course_id().into_inner(), Self::TABLE, Self::COURSE_FK)?;
            write_scalars(self, session).await
        }
        .boxed()
    }

    fn cascade_delete<'a>(
        &'a self,
        session: &'a mut dyn StoreSession,
    ) -> BoxFuture<'a, Result<(), DbError>> {
        async move {
            if !self.id().is_unset() {
                delete_by_id(session, Self::TABLE, self.id().into_inner()).await?;
            }
            Ok(())
        }
        .boxed()
    }
}

impl Persist for Course {
    fn cascade_write<'a>(
        &'a mut self,
        session: &'a mut dyn StoreSession,
    ) -> BoxFuture<'a, Result<(), DbError>> {
        async move {
            require_parent(self.term_id().into_inner(), Self::TABLE, Self::TERM_FK)?;
            write_scalars(self, session).await?;
            for removed in self.take_removed_projects() {
                delete_by_id(session, Project::TABLE, removed.into_inner()).await?;
            }
            let course_id = self.id();
            for project in self.projects_mut() {
                project.set_course_id(course_id);
                project.cascade_write(session).await?;
            }
            Ok(())
        }
        .boxed()
    }

    fn cascade_delete<'a>(
        &'a self,
        session: &'a mut dyn StoreSession,
    ) -> BoxFuture<'a, Result<(), DbError>> {
        async move {
            for removed in self.removed_projects() {
                delete_by_id(session, Project::TABLE, removed.into_inner()).await?;
            }
            if !self.id().is_unset() {
                delete_course_rows(session, self.id()).await?;
            }
            Ok(())
        }
        .boxed()
    }
}

impl Persist for Term {
    fn cascade_write<'a>(
        &'a mut self,
        session: &'a mut dyn StoreSession,
    ) -> BoxFuture<'a, Result<(), DbError>> {
        async move {
            write_scalars(self, session).await?;
            for removed in self.take_removed_courses() {
                delete_course_rows(session, removed).await?;
            }
            let term_id = self.id();
            for course in self.courses_mut() {
                course.set_term_id(term_id);
                course.cascade_write(session).await?;
            }
            Ok(())
        }
        .boxed()
    }

    fn cascade_delete<'a>(
        &'a self,
        session: &'a mut dyn StoreSession,
    ) -> BoxFuture<'a, Result<(), DbError>> {
        async move {
            for removed in self.removed_courses() {
                delete_course_rows(session, *removed).await?;
            }
            for course in self.courses() {
                course.cascade_delete(session).await?;
            }
            if !self.id().is_unset() {
                let term_id = Value::from(self.id().into_inner());
                session
                    .delete_where(Course::TABLE, Course::TERM_FK, &term_id)
                    .await?;
                delete_by_id(session, Self::TABLE, self.id().into_inner()).await?;
            }
            Ok(())
        }
        .boxed()
    }
}

impl Persist for Entity {
    fn cascade_write<'a>(
        &'a mut self,
        session: &'a mut dyn StoreSession,
    ) -> BoxFuture<'a, Result<(), DbError>> {
        match self {
            Self::User(user) => user.cascade_write(session),
            Self::Term(term) => term.cascade_write(session),
            Self::Course(course) => course.cascade_write(session),
            Self::Project(project) => project.cascade_write(session),
        }
    }

    fn cascade_delete<'a>(
        &'a self,
        session: &'a mut dyn StoreSession,
    ) -> BoxFuture<'a, Result<(), DbError>> {
        match self {
            Self::User(user) => user.cascade_delete(session),
            Self::Term(term) => term.cascade_delete(session),
            Self::Course(course) => course.cascade_delete(session),
            Self::Project(project) => project.cascade_delete(session),
        }
    }
}

/// Writes aggregates to a [`Store`].
#[derive(Clone, Copy)]
pub struct DatabaseWriter<'s> {
    store: &'s dyn Store,
}

impl std::fmt::Debug for DatabaseWriter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseWriter").finish_non_exhaustive()
    }
}

impl<'s> DatabaseWriter<'s> {
    /// Create a writer over `store`.
    pub const fn new(store: &'s dyn Store) -> Self {
        Self { store }
    }

    /// Persist `root` and its owned graph in one transaction.
    ///
    /// Entities with an unset id are inserted and receive their new id;
    /// the rest are updated in place. On error nothing is committed and
    /// `root` is left untouched.
    pub async fn write_root<T: Persist>(&self, root: &mut T) -> Result<(), DbError> {
        let mut staged = root.clone();
        let mut session = self.store.begin().await?;

        match staged.cascade_write(&mut *session).await {
            Ok(()) => {
                session.commit().await?;
                info!(
                    entity = staged.type_name(),
                    id = staged.id(),
                    created = root.id() == 0,
                    "Wrote aggregate"
                );
                *root = staged;
                Ok(())
            }
            Err(err) => {
                warn!(
                    entity = root.type_name(),
                    id = root.id(),
                    error = %err,
                    "Aggregate write failed; rolling back"
                );
                if let Err(rollback) = session.rollback().await {
                    error!(error = %rollback, "Rollback failed");
                }
                Err(err)
            }
        }
    }

    /// Delete `root` and its owned graph in one transaction.
    pub async fn delete_root<T: Persist>(&self, root: &T) -> Result<(), DbError> {
        let mut session = self.store.begin().await?;
        match root.cascade_delete(&mut *session).await {
            Ok(()) => {
                session.commit().await?;
                info!(entity = root.type_name(), id = root.id(), "Deleted aggregate");
                Ok(())
            }
            Err(err) => {
                if let Err(rollback) = session.rollback().await {
                    error!(error = %rollback, "Rollback failed");
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use coursehub_types::TermName;

    use super::*;
    use crate::memory::MemoryStore;

    #[tokio::test]
    async fn fresh_write_inserts_and_rewrite_updates() {
        let store = MemoryStore::new();
        let writer = DatabaseWriter::new(&store);

        let mut user = User::default();
        user.set_name("Ada");
        writer.write_root(&mut user).await.unwrap();
        assert!(!user.id().is_unset());

        user.set_name("Ada Lovelace");
        writer.write_root(&mut user).await.unwrap();
        assert_eq!(store.row_count(User::TABLE).await, 1);
    }

    #[tokio::test]
    async fn orphan_children_are_rejected_before_any_write() {
        let store = MemoryStore::new();
        let writer = DatabaseWriter::new(&store);

        let mut project = Project::new("Parser");
        let err = writer.write_root(&mut project).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::MissingParent { table: "projects", column: "courseId" }
        ));

        let mut course = Course::new("Compilers");
        course.add_project(Project::new("Lexer"));
        let err = writer.write_root(&mut course).await.unwrap_err();
        assert!(matches!(err, DbError::MissingParent { column: "termId", .. }));
        assert_eq!(store.row_count(Course::TABLE).await, 0);
        assert_eq!(store.row_count(Project::TABLE).await, 0);
    }

    #[tokio::test]
    async fn cascade_assigns_foreign_keys() {
        let store = MemoryStore::new();
        let writer = DatabaseWriter::new(&store);

        let mut course = Course::new("Compilers");
        course.add_project(Project::new("Lexer"));
        let mut term = Term::new(TermName::parse("SS2025").unwrap(), "Summer 2025");
        term.add_course(course);
        writer.write_root(&mut term).await.unwrap();

        let course = term.courses().first().unwrap();
        assert_eq!(course.term_id(), term.id());
        assert_eq!(course.projects().first().unwrap().course_id(), course.id());
        assert_eq!(store.row_count(Project::TABLE).await, 1);
    }

    #[tokio::test]
    async fn update_of_missing_row_rolls_back_everything() {
        let store = MemoryStore::new();
        let writer = DatabaseWriter::new(&store);

        let mut ghost = Course::new("Ghost");
        ghost.set_id(99);
        let mut term = Term::new(TermName::parse("WS2024/25").unwrap(), "Winter");
        term.add_course(Course::new("Real"));
        term.add_course(ghost);

        let err = writer.write_root(&mut term).await.unwrap_err();
        assert!(matches!(err, DbError::RowNotFound { id: 99, .. }));
        assert!(term.id().is_unset());
        assert!(term.courses().first().unwrap().id().is_unset());
        assert_eq!(store.row_count(Term::TABLE).await, 0);
        assert_eq!(store.row_count(Course::TABLE).await, 0);
    }

    #[tokio::test]
    async fn delete_root_removes_the_graph() {
        let store = MemoryStore::new();
        let writer = DatabaseWriter::new(&store);

        let mut course = Course::new("Compilers");
        course.add_project(Project::new("Lexer"));
        course.add_project(Project::new("Parser"));
        let mut term = Term::new(TermName::parse("SS2025").unwrap(), "Summer 2025");
        term.add_course(course);
        writer.write_root(&mut term).await.unwrap();
        assert_eq!(store.row_count(Project::TABLE).await, 2);

        let course = term.courses().first().unwrap();
        writer.delete_root(course).await.unwrap();
        assert_eq!(store.row_count(Term::TABLE).await, 1);
        assert_eq!(store.row_count(Course::TABLE).await, 0);
        assert_eq!(store.row_count(Project::TABLE).await, 0);
    }
}
