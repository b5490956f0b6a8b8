//! Hydrate entity graphs from stored rows.
//!
//! A [`DatabaseResultSetReader`] wraps one row. When the entity asks for an
//! owned collection the reader selects the child rows by foreign key and
//! recursively builds a fresh reader for each one, so a term load issues one
//! query for the term, one per course list and one per project list.

use coursehub_types::RoleRegistry;
use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::entities::Entity;
use crate::error::DbError;
use crate::factory::SerializableFactory;
use crate::serializable::{Reader, Serializable};
use crate::store::Store;
use crate::value::{Row, Value};

/// Everything a reader needs besides the row itself.
#[derive(Clone, Copy)]
pub struct ReadContext<'s> {
    store: &'s dyn Store,
    factory: &'s SerializableFactory,
    roles: &'s RoleRegistry,
}

impl<'s> ReadContext<'s> {
    /// Bundle a store, a factory and a role registry.
    pub const fn new(
        store: &'s dyn Store,
        factory: &'s SerializableFactory,
        roles: &'s RoleRegistry,
    ) -> Self {
        Self {
            store,
            factory,
            roles,
        }
    }

    /// Backing store.
    pub const fn store(&self) -> &'s dyn Store {
        self.store
    }

    /// Entity factory.
    pub const fn factory(&self) -> &'s SerializableFactory {
        self.factory
    }

    /// Role registry used to resolve user roles.
    pub const fn roles(&self) -> &'s RoleRegistry {
        self.roles
    }
}

impl std::fmt::Debug for ReadContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadContext")
            .field("factory", self.factory)
            .field("roles_loaded", &self.roles.is_loaded())
            .finish_non_exhaustive()
    }
}

/// A [`Reader`] positioned on one stored row.
#[derive(Debug)]
pub struct DatabaseResultSetReader<'s> {
    row: Row,
    table: &'static str,
    context: ReadContext<'s>,
}

impl<'s> DatabaseResultSetReader<'s> {
    /// Wrap `row`. The table is filled in once the target type is known.
    pub const fn new(row: Row, context: ReadContext<'s>) -> Self {
        Self {
            row,
            table: "",
            context,
        }
    }

    /// Build a `T` and its owned collections from the row.
    pub async fn read_root<T>(self) -> Result<T, DbError>
    where
        T: Serializable + Default,
    {
        let mut root = T::default();
        self.hydrate(&mut root).await?;
        Ok(root)
    }

    /// Build the entity registered as `type_name` from the row.
    pub async fn read_root_named(self, type_name: &str) -> Result<Entity, DbError> {
        let mut root = self.context.factory.create(type_name)?;
        self.hydrate(&mut root).await?;
        Ok(root)
    }

    async fn hydrate(mut self, target: &mut dyn Serializable) -> Result<(), DbError> {
        self.table = target.table();
        target.set_id(self.row.id()?);
        target.read_from(&mut self).await
    }

    fn child_table(&self, type_name: &str) -> Result<&'static str, DbError> {
        Ok(self.context.factory.create(type_name)?.table())
    }
}

impl Reader for DatabaseResultSetReader<'_> {
    fn table(&self) -> &str {
        self.table
    }

    fn id(&self) -> i64 {
        self.row.id().unwrap_or_default()
    }

    fn read_value(&self, attribute: &str) -> Option<&Value> {
        self.row.get(attribute)
    }

    fn role_registry(&self) -> &RoleRegistry {
        self.context.roles
    }

    fn read_object<'a>(
        &'a mut self,
        attribute: &'a str,
        type_name: &'a str,
    ) -> BoxFuture<'a, Result<Option<Entity>, DbError>> {
        async move {
            let Some(id) = self.read_number(attribute)? else {
                return Ok(None);
            };
            let table = self.child_table(type_name)?;
            let rows = self
                .context
                .store
                .select_where(table, "id", &Value::from(id))
                .await?;
            let Some(row) = rows.into_iter().next() else {
                warn!(
                    table = self.table,
                    id = self.id(),
                    attribute,
                    target = id,
                    "Dangling reference; loading as null"
                );
                return Ok(None);
            };
            let entity = Self::new(row, self.context)
                .read_root_named(type_name)
                .await?;
            Ok(Some(entity))
        }
        .boxed()
    }

    fn read_objects<'a>(
        &'a mut self,
        foreign_key: &'a str,
        type_name: &'a str,
    ) -> BoxFuture<'a, Result<Vec<Entity>, DbError>> {
        async move {
            let table = self.child_table(type_name)?;
            let parent = Value::from(self.row.id()?);
            let rows = self
                .context
                .store
                .select_where(table, foreign_key, &parent)
                .await?;

            let mut children = Vec::with_capacity(rows.len());
            for row in rows {
                let child = Self::new(row, self.context)
                    .read_root_named(type_name)
                    .await?;
                children.push(child);
            }
            children.sort_by_key(Serializable::id);

            debug!(
                parent_table = self.table,
                parent_id = self.id(),
                child_table = table,
                count = children.len(),
                "Loaded owned collection"
            );
            Ok(children)
        }
        .boxed()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use coursehub_types::{CourseId, ProjectId};

    use super::*;
    use crate::entities::{Course, Project};
    use crate::memory::MemoryStore;

    #[tokio::test]
    async fn hydrates_row_and_children() {
        let store = MemoryStore::new();
        let course_id = store
            .seed(
                "courses",
                Row::new()
                    .with("courseName", Value::from("Compilers"))
                    .with("termId", Value::from(1))
                    .with("studentsCanCreateProject", Value::Bool(Some(true))),
            )
            .await
            .unwrap();
        for name in ["Parser", "Lexer"] {
            store
                .seed(
                    "projects",
                    Row::new()
                        .with("projectName", Value::from(name))
                        .with("courseId", Value::from(course_id))
                        .with("studentsCanJoinProject", Value::Bool(None)),
                )
                .await
                .unwrap();
        }

        let factory = SerializableFactory::new();
        let roles = RoleRegistry::new();
        let context = ReadContext::new(&store, &factory, &roles);
        let row = store
            .select_where("courses", "id", &Value::from(course_id))
            .await
            .unwrap()
            .pop()
            .unwrap();

        let course: Course = DatabaseResultSetReader::new(row, context)
            .read_root()
            .await
            .unwrap();

        assert_eq!(course.id(), CourseId::new(course_id));
        assert!(course.students_can_create_project());
        let names: Vec<_> = course.projects().iter().map(Project::project_name).collect();
        assert_eq!(names, ["Parser", "Lexer"]);
        assert!(course.find_project_by_id(ProjectId::new(1)).is_some());
        assert!(!course.projects().first().unwrap().students_can_join_project());
    }

    #[tokio::test]
    async fn row_without_id_is_rejected() {
        let store = MemoryStore::new();
        let factory = SerializableFactory::new();
        let roles = RoleRegistry::new();
        let context = ReadContext::new(&store, &factory, &roles);
        let row = Row::new().with("projectName", Value::from("Orphan"));
        let err = DatabaseResultSetReader::new(row, context)
            .read_root::<Project>()
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::MissingAttribute(_)));
    }
}
