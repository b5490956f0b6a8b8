//! User roles and the id/key registry they are resolved through.
//!
//! Roles live in the `roles` table as `(id, userRole)` pairs. The registry
//! is filled exactly once at startup and is read-only afterwards. It is
//! backed by a [`OnceLock`], so a concurrent second load can never be
//! observed half-done: readers see either "not loaded" or the full table.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::RoleId;

/// Immutable bidirectional id <-> key map.
#[derive(Debug, Default)]
struct RoleTable {
    by_id: BTreeMap<RoleId, String>,
    by_key: BTreeMap<String, RoleId>,
}

/// Lookup table between role ids and role keys.
#[derive(Debug, Default)]
pub struct RoleRegistry {
    table: OnceLock<RoleTable>,
}

impl RoleRegistry {
    /// Create an empty, not yet loaded registry.
    pub const fn new() -> Self {
        Self {
            table: OnceLock::new(),
        }
    }

    /// Create a registry that is already loaded with `entries`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::IllegalArgument`] if an id or key repeats.
    pub fn from_entries<I, K>(entries: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = (RoleId, K)>,
        K: Into<String>,
    {
        let registry = Self::new();
        registry.install(entries)?;
        Ok(registry)
    }

    /// Fill the registry. Only the first successful call has an effect.
    ///
    /// Returns `true` if this call loaded the table and `false` if the
    /// registry was already loaded.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::IllegalArgument`] if an id or key repeats.
    pub fn install<I, K>(&self, entries: I) -> Result<bool, DomainError>
    where
        I: IntoIterator<Item = (RoleId, K)>,
        K: Into<String>,
    {
        if self.is_loaded() {
            return Ok(false);
        }
        let mut table = RoleTable::default();
        for (id, key) in entries {
            let key = key.into();
            if table.by_id.contains_key(&id) || table.by_key.contains_key(&key) {
                return Err(DomainError::illegal(format!(
                    "duplicate role entry: {id} / {key:?}"
                )));
            }
            table.by_key.insert(key.clone(), id);
            table.by_id.insert(id, key);
        }
        Ok(self.table.set(table).is_ok())
    }

    /// Whether [`RoleRegistry::install`] has completed.
    pub fn is_loaded(&self) -> bool {
        self.table.get().is_some()
    }

    fn loaded(&self) -> Result<&RoleTable, DomainError> {
        self.table
            .get()
            .ok_or_else(|| DomainError::illegal("role registry has not been loaded"))
    }

    /// Id of the role named `role_key`.
    ///
    /// # Errors
    ///
    /// Fails if the registry is not loaded or the key is unknown.
    pub fn get_id(&self, role_key: &str) -> Result<RoleId, DomainError> {
        self.loaded()?
            .by_key
            .get(role_key)
            .copied()
            .ok_or_else(|| DomainError::illegal(format!("unknown role key: {role_key:?}")))
    }

    /// Key of the role with id `id`.
    ///
    /// # Errors
    ///
    /// Fails if the registry is not loaded or the id is unknown.
    pub fn get_role_key(&self, id: RoleId) -> Result<&str, DomainError> {
        self.loaded()?
            .by_id
            .get(&id)
            .map(String::as_str)
            .ok_or_else(|| DomainError::illegal(format!("unknown role id: {id}")))
    }

    /// All roles ordered by id. Empty if not loaded.
    pub fn roles(&self) -> Vec<UserRole> {
        self.table
            .get()
            .map(|table| {
                table
                    .by_id
                    .iter()
                    .map(|(id, key)| UserRole {
                        id: *id,
                        key: key.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// A resolved role: both halves of a registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserRole {
    id: RoleId,
    key: String,
}

impl UserRole {
    /// Resolve a role from its id.
    ///
    /// # Errors
    ///
    /// Fails if the registry is not loaded or the id is unknown.
    pub fn from_id(id: RoleId, registry: &RoleRegistry) -> Result<Self, DomainError> {
        let key = registry.get_role_key(id)?.to_owned();
        Ok(Self { id, key })
    }

    /// Resolve a role from its key.
    ///
    /// # Errors
    ///
    /// Fails if the registry is not loaded or the key is unknown.
    pub fn from_role(key: &str, registry: &RoleRegistry) -> Result<Self, DomainError> {
        let id = registry.get_id(key)?;
        Ok(Self {
            id,
            key: key.to_owned(),
        })
    }

    /// Row id in the `roles` table.
    pub const fn id(&self) -> RoleId {
        self.id
    }

    /// Role key, e.g. `admin`.
    pub fn key(&self) -> &str {
        &self.key
    }
}
