//! Shared value types for the CourseHub persistence layer.
//!
//! Everything here is pure: parsing, validation and state transitions with
//! no I/O. Entities in `coursehub-db` hold these types and the storage
//! readers decide how strictly to apply them.
//!
//! # Modules
//!
//! - [`ids`] -- Typed integer identifiers assigned by storage
//! - [`term_name`] -- Term name grammar with strict and legacy parsing
//! - [`user_status`] -- Account status state machine
//! - [`role`] -- Role registry and resolved user roles
//! - [`email`] -- Validated e-mail addresses
//! - [`error`] -- Domain validation errors

pub mod email;
pub mod error;
pub mod ids;
pub mod role;
pub mod term_name;
pub mod user_status;

pub use email::Email;
pub use error::DomainError;
pub use ids::{CourseId, ProjectId, RoleId, TermId, UserId};
pub use role::{RoleRegistry, UserRole};
pub use term_name::{Season, TermName, TermNameParse};
pub use user_status::UserStatus;

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for the web client.

    #[test]
    fn export_bindings() {
        use ts_rs::TS;

        let _ = crate::ids::UserId::export_all();
        let _ = crate::ids::TermId::export_all();
        let _ = crate::ids::CourseId::export_all();
        let _ = crate::ids::ProjectId::export_all();
        let _ = crate::ids::RoleId::export_all();
        let _ = crate::user_status::UserStatus::export_all();
    }
}
