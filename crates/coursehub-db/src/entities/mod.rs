//! Persisted aggregates.
//!
//! `Term → Course → Project` is one aggregate rooted at [`Term`]; [`User`]
//! stands alone. [`Entity`] is the closed set of everything the factory can
//! construct, so a reader can hand back a child without knowing its type.

mod course;
mod project;
mod term;
mod user;

pub use course::Course;
pub use project::Project;
pub use term::Term;
pub use user::{ExpiringToken, User};

use futures::future::BoxFuture;

use crate::error::DbError;
use crate::serializable::{Reader, Serializable, Writer};

/// Any entity the persistence layer knows how to build.
#[allow(clippy::large_enum_variant)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    /// A user account.
    User(User),
    /// A term with its courses.
    Term(Term),
    /// A course with its projects.
    Course(Course),
    /// A project.
    Project(Project),
}

impl Entity {
    fn inner(&self) -> &dyn Serializable {
        match self {
            Self::User(user) => user,
            Self::Term(term) => term,
            Self::Course(course) => course,
            Self::Project(project) => project,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Serializable {
        match self {
            Self::User(user) => user,
            Self::Term(term) => term,
            Self::Course(course) => course,
            Self::Project(project) => project,
        }
    }
}

impl Serializable for Entity {
    fn type_name(&self) -> &'static str {
        self.inner().type_name()
    }

    fn table(&self) -> &'static str {
        self.inner().table()
    }

    fn id(&self) -> i64 {
        self.inner().id()
    }

    fn set_id(&mut self, id: i64) {
        self.inner_mut().set_id(id);
    }

    fn read_from<'a>(&'a mut self, reader: &'a mut dyn Reader) -> BoxFuture<'a, Result<(), DbError>> {
        self.inner_mut().read_from(reader)
    }

    fn write_to(&self, writer: &mut dyn Writer) {
        self.inner().write_to(writer);
    }
}

macro_rules! entity_conversions {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Entity {
                fn from(value: $variant) -> Self {
                    Self::$variant(value)
                }
            }

            impl TryFrom<Entity> for $variant {
                type Error = DbError;

                fn try_from(entity: Entity) -> Result<Self, Self::Error> {
                    match entity {
                        Entity::$variant(value) => Ok(value),
                        other => Err(DbError::UnexpectedEntity {
                            expected: $variant::TYPE_NAME,
                            found: other.type_name(),
                        }),
                    }
                }
            }
        )*
    };
}

entity_conversions!(User, Term, Course, Project);
