//! Object-graph persistence for CourseHub aggregates.
//!
//! Entities implement [`Serializable`] and never touch storage themselves.
//! The [`DatabaseWriter`] cascades an aggregate into a [`Store`] inside one
//! transaction; the [`DatabaseResultSetReader`] rebuilds one from rows,
//! asking the [`SerializableFactory`] for each child by type name.
//!
//! # Architecture
//!
//! ```text
//! ObjectHandler (lookups by id / natural key)
//!     |
//!     +-- DatabaseResultSetReader --> Store::select_where (2 + N per term)
//!     |       +-- SerializableFactory (type name -> blank entity)
//!     |
//! DatabaseWriter::write_root
//!     +-- Store::begin --> StoreSession (insert / update / delete, commit)
//!
//! Store implementations
//!     |-- PostgresPool  (sqlx, PostgreSQL)
//!     +-- MemoryStore   (in-process, tests and tooling)
//! ```
//!
//! Reads are tolerant of values written under older validation rules
//! (logged, never fatal); writes only ever see values that passed strict
//! parsing when they were constructed.
//!
//! # Modules
//!
//! - [`serializable`] -- `Reader` / `Writer` / `Serializable` contracts
//! - [`entities`] -- `User`, `Term`, `Course`, `Project`
//! - [`factory`] -- Construct entities by type name
//! - [`reader`] -- Recursive graph hydration
//! - [`writer`] -- Transactional cascading writes and deletes
//! - [`object_handler`] -- Lookups by id and natural key
//! - [`roles`] -- Role registry loading
//! - [`store`] -- Backend seam
//! - [`postgres`] -- `PostgreSQL` pool, configuration and store
//! - [`memory`] -- In-memory store
//! - [`value`] -- Typed values and rows
//! - [`error`] -- Shared error types

pub mod entities;
pub mod error;
pub mod factory;
pub mod memory;
pub mod object_handler;
pub mod postgres;
pub mod reader;
pub mod roles;
pub mod serializable;
pub mod store;
pub mod value;
pub mod writer;

// Re-export primary types for convenience.
pub use entities::{Course, Entity, ExpiringToken, Project, Term, User};
pub use error::DbError;
pub use factory::SerializableFactory;
pub use memory::MemoryStore;
pub use object_handler::ObjectHandler;
pub use postgres::{PostgresConfig, PostgresPool};
pub use reader::{DatabaseResultSetReader, ReadContext};
pub use roles::load_roles;
pub use serializable::{Reader, RowWriter, Serializable, Writer};
pub use store::{Store, StoreSession};
pub use value::{Row, Value};
pub use writer::{DatabaseWriter, Persist};
