//! Construct empty entities by type name.

use std::collections::BTreeMap;

use crate::entities::{Course, Entity, Project, Term, User};
use crate::error::DbError;

/// Constructor for a blank, unpersisted entity.
pub type Constructor = fn() -> Entity;

/// Maps type names (`Term`, `Course`, ...) to constructors.
///
/// The reader asks the factory for a blank instance before hydrating each
/// child row, so every persisted type must be registered here.
#[derive(Debug, Clone)]
pub struct SerializableFactory {
    constructors: BTreeMap<&'static str, Constructor>,
}

impl SerializableFactory {
    /// A factory that knows every built-in entity.
    pub fn new() -> Self {
        let mut factory = Self::empty();
        factory.register(User::TYPE_NAME, || Entity::User(User::default()));
        factory.register(Term::TYPE_NAME, || Entity::Term(Term::default()));
        factory.register(Course::TYPE_NAME, || Entity::Course(Course::default()));
        factory.register(Project::TYPE_NAME, || Entity::Project(Project::default()));
        factory
    }

    /// A factory with nothing registered.
    pub const fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Register (or replace) the constructor for `type_name`.
    pub fn register(&mut self, type_name: &'static str, constructor: Constructor) {
        self.constructors.insert(type_name, constructor);
    }

    /// Build a blank entity of `type_name`.
    pub fn create(&self, type_name: &str) -> Result<Entity, DbError> {
        self.constructors
            .get(type_name)
            .map(|construct| construct())
            .ok_or_else(|| DbError::UnknownEntityType(type_name.to_owned()))
    }

    /// Registered names, sorted.
    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.constructors.keys().copied()
    }
}

impl Default for SerializableFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::serializable::Serializable;

    #[test]
    fn creates_every_builtin_type() {
        let factory = SerializableFactory::new();
        for name in ["User", "Term", "Course", "Project"] {
            let entity = factory.create(name).unwrap();
            assert_eq!(entity.type_name(), name);
            assert_eq!(entity.id(), 0);
        }
        assert_eq!(factory.type_names().count(), 4);
    }

    #[test]
    fn unknown_type_is_an_error() {
        let factory = SerializableFactory::new();
        let err = factory.create("Lecture").unwrap_err();
        assert!(matches!(err, DbError::UnknownEntityType(name) if name == "Lecture"));
        assert!(SerializableFactory::empty().create("Term").is_err());
    }
}
