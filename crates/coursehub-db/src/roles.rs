//! Load the role table into a [`RoleRegistry`].

use coursehub_types::{RoleId, RoleRegistry};
use tracing::info;

use crate::error::DbError;
use crate::store::Store;
use crate::value::Value;

/// Table holding one row per role.
pub const ROLES_TABLE: &str = "roles";
/// Column holding the role key.
pub const ROLE_KEY_COLUMN: &str = "userRole";

/// Fill `registry` from the `roles` table.
///
/// Returns `false` without querying if the registry is already loaded.
/// Concurrent callers may both query, but only one table is installed.
pub async fn load_roles(registry: &RoleRegistry, store: &dyn Store) -> Result<bool, DbError> {
    if registry.is_loaded() {
        return Ok(false);
    }

    let rows = store.select_all(ROLES_TABLE).await?;
    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        let id = row.id()?;
        let key = match row.get(ROLE_KEY_COLUMN) {
            Some(Value::Text(Some(key))) => key.clone(),
            Some(_) => {
                return Err(DbError::TypeMismatch {
                    attribute: ROLE_KEY_COLUMN.to_owned(),
                    expected: "text",
                });
            }
            None => return Err(DbError::MissingAttribute(ROLE_KEY_COLUMN.to_owned())),
        };
        entries.push((RoleId::new(id), key));
    }

    let count = entries.len();
    let installed = registry.install(entries)?;
    if installed {
        info!(roles = count, "Loaded role registry");
    }
    Ok(installed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::value::Row;

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        for key in ["user", "admin"] {
            store
                .seed(ROLES_TABLE, Row::new().with(ROLE_KEY_COLUMN, Value::from(key)))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn loads_once() {
        let store = seeded().await;
        let registry = RoleRegistry::new();

        assert!(load_roles(&registry, &store).await.unwrap());
        assert_eq!(registry.get_id("admin").unwrap(), RoleId::new(2));
        assert_eq!(registry.get_role_key(RoleId::new(1)).unwrap(), "user");

        store.reset_select_count();
        assert!(!load_roles(&registry, &store).await.unwrap());
        assert_eq!(store.select_count(), 0);
    }

    #[tokio::test]
    async fn null_role_key_is_rejected() {
        let store = MemoryStore::new();
        store
            .seed(ROLES_TABLE, Row::new().with(ROLE_KEY_COLUMN, Value::Text(None)))
            .await
            .unwrap();
        let registry = RoleRegistry::new();
        assert!(load_roles(&registry, &store).await.is_err());
        assert!(!registry.is_loaded());
    }
}
