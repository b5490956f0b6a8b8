//! Type-safe identifier wrappers around storage-assigned integers.
//!
//! Every persisted entity has a strongly-typed ID so a course id can never
//! be passed where a term id is expected. IDs are generated by the database
//! on first insert; the value `0` means "not yet persisted".

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Generates a newtype wrapper around `i64` with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub i64);

        impl $name {
            /// The identity of an entity that has never been written.
            pub const UNSET: Self = Self(0);

            /// Wrap a raw storage identity.
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Return the inner integer value.
            pub const fn into_inner(self) -> i64 {
                self.0
            }

            /// Whether this identity has not been assigned by storage yet.
            pub const fn is_unset(self) -> bool {
                self.0 == 0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Identifier of a user account.
    UserId
}

define_id! {
    /// Identifier of a term (semester).
    TermId
}

define_id! {
    /// Identifier of a course within a term.
    CourseId
}

define_id! {
    /// Identifier of a project within a course.
    ProjectId
}

define_id! {
    /// Identifier of a row in the `roles` table.
    RoleId
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unset() {
        assert!(TermId::default().is_unset());
        assert_eq!(CourseId::UNSET.into_inner(), 0);
    }

    #[test]
    fn assigned_id_is_not_unset() {
        let id = ProjectId::new(17);
        assert!(!id.is_unset());
        assert_eq!(i64::from(id), 17);
        assert_eq!(id.to_string(), "17");
    }

    #[test]
    fn ids_serialize_as_plain_numbers() {
        let json = serde_json::to_string(&UserId::new(5)).unwrap();
        assert_eq!(json, "5");
    }
}
