//! In-process [`Store`] with the same contract as the `PostgreSQL` backend.
//!
//! Tables are created on first insert and ids start at 1 per table. A
//! session takes the store lock for its whole lifetime and works on a
//! staged copy, so commits are atomic and writers are serialized. Reads
//! issued while a session is open wait for it to finish.
//!
//! Rows come back in storage order, not id order. Like a heap table, an
//! updated row moves to the end, so callers that need an order must sort.
//!
//! The store counts `SELECT`s, which lets tests observe how many queries a
//! graph load issues.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::DbError;
use crate::store::{Store, StoreSession, check_identifier};
use crate::value::{Row, Value};

#[derive(Debug, Clone, Default)]
struct Table {
    last_id: i64,
    rows: Vec<Row>,
}

impl Table {
    fn insert(&mut self, row: &Row) -> Result<i64, DbError> {
        let id = self
            .last_id
            .checked_add(1)
            .ok_or_else(|| DbError::Config(String::from("memory table id space exhausted")))?;
        self.last_id = id;
        self.rows.push(row.clone().with("id", Value::Number(Some(id))));
        Ok(id)
    }

    /// Apply `changes` to row `id` and move it to the end. Returns whether
    /// the row existed.
    fn update(&mut self, id: i64, changes: &Row) -> bool {
        let key = Value::Number(Some(id));
        let Some(position) = self.rows.iter().position(|row| row.get("id") == Some(&key)) else {
            return false;
        };
        let mut stored = self.rows.remove(position);
        for (name, value) in changes.iter() {
            stored.set(name, value.clone());
        }
        self.rows.push(stored);
        true
    }
}

type Tables = BTreeMap<String, Table>;

fn matches(row: &Row, column: &str, value: &Value) -> bool {
    !value.is_null() && row.get(column) == Some(value)
}

/// Shared in-memory store. Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    selects: Arc<AtomicUsize>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row directly, bypassing entities. Returns the new id.
    ///
    /// Used to plant rows that the entity write path would refuse.
    pub async fn seed(&self, table: &str, row: Row) -> Result<i64, DbError> {
        check_identifier(table)?;
        let mut tables = self.tables.lock().await;
        tables.entry(table.to_owned()).or_default().insert(&row)
    }

    /// Number of rows currently in `table`.
    pub async fn row_count(&self, table: &str) -> usize {
        self.tables
            .lock()
            .await
            .get(table)
            .map_or(0, |t| t.rows.len())
    }

    /// Number of `SELECT`s served since creation or the last reset.
    pub fn select_count(&self) -> usize {
        self.selects.load(Ordering::SeqCst)
    }

    /// Reset the `SELECT` counter.
    pub fn reset_select_count(&self) {
        self.selects.store(0, Ordering::SeqCst);
    }
}

impl Store for MemoryStore {
    fn select_where<'a>(
        &'a self,
        table: &'a str,
        column: &'a str,
        value: &'a Value,
    ) -> BoxFuture<'a, Result<Vec<Row>, DbError>> {
        async move {
            check_identifier(table)?;
            check_identifier(column)?;
            self.selects.fetch_add(1, Ordering::SeqCst);
            let tables = self.tables.lock().await;
            Ok(tables
                .get(table)
                .map(|t| {
                    t.rows
                        .iter()
                        .filter(|row| matches(row, column, value))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default())
        }
        .boxed()
    }

    fn select_all<'a>(&'a self, table: &'a str) -> BoxFuture<'a, Result<Vec<Row>, DbError>> {
        async move {
            check_identifier(table)?;
            self.selects.fetch_add(1, Ordering::SeqCst);
            let tables = self.tables.lock().await;
            Ok(tables
                .get(table)
                .map(|t| t.rows.clone())
                .unwrap_or_default())
        }
        .boxed()
    }

    fn begin(&self) -> BoxFuture<'_, Result<Box<dyn StoreSession>, DbError>> {
        async move {
            let guard = Arc::clone(&self.tables).lock_owned().await;
            let staged = guard.clone();
            Ok(Box::new(MemorySession { guard, staged }) as Box<dyn StoreSession>)
        }
        .boxed()
    }
}

/// A write transaction over a staged copy of the tables.
struct MemorySession {
    guard: OwnedMutexGuard<Tables>,
    staged: Tables,
}

impl StoreSession for MemorySession {
    fn insert<'a>(&'a mut self, table: &'a str, row: &'a Row) -> BoxFuture<'a, Result<i64, DbError>> {
        async move {
            check_identifier(table)?;
            self.staged.entry(table.to_owned()).or_default().insert(row)
        }
        .boxed()
    }

    fn update<'a>(
        &'a mut self,
        table: &'a str,
        id: i64,
        row: &'a Row,
    ) -> BoxFuture<'a, Result<u64, DbError>> {
        async move {
            check_identifier(table)?;
            let updated = self
                .staged
                .get_mut(table)
                .is_some_and(|t| t.update(id, row));
            Ok(u64::from(updated))
        }
        .boxed()
    }

    fn delete_where<'a>(
        &'a mut self,
        table: &'a str,
        column: &'a str,
        value: &'a Value,
    ) -> BoxFuture<'a, Result<u64, DbError>> {
        async move {
            check_identifier(table)?;
            check_identifier(column)?;
            let Some(t) = self.staged.get_mut(table) else {
                return Ok(0);
            };
            let before = t.rows.len();
            t.rows.retain(|row| !matches(row, column, value));
            let removed = before.saturating_sub(t.rows.len());
            Ok(u64::try_from(removed).unwrap_or(u64::MAX))
        }
        .boxed()
    }

    fn commit(self: Box<Self>) -> BoxFuture<'static, Result<(), DbError>> {
        async move {
            let Self { mut guard, staged } = *self;
            *guard = staged;
            Ok(())
        }
        .boxed()
    }

    fn rollback(self: Box<Self>) -> BoxFuture<'static, Result<(), DbError>> {
        async move {
            drop(self);
            Ok(())
        }
        .boxed()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn term(name: &str) -> Row {
        Row::new().with("termName", Value::from(name))
    }

    #[tokio::test]
    async fn committed_inserts_are_visible() {
        let store = MemoryStore::new();
        let mut session = store.begin().await.unwrap();
        let first = session.insert("terms", &term("WS2024/25")).await.unwrap();
        let second = session.insert("terms", &term("SS2025")).await.unwrap();
        session.commit().await.unwrap();

        assert_eq!((first, second), (1, 2));
        assert_eq!(store.row_count("terms").await, 2);
        let rows = store
            .select_where("terms", "termName", &Value::from("SS2025"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id().unwrap(), 2);
    }

    #[tokio::test]
    async fn rollback_discards_writes() {
        let store = MemoryStore::new();
        let mut session = store.begin().await.unwrap();
        session.insert("terms", &term("WS2024")).await.unwrap();
        session.rollback().await.unwrap();
        assert_eq!(store.row_count("terms").await, 0);
    }

    #[tokio::test]
    async fn update_reports_missing_rows() {
        let store = MemoryStore::new();
        store.seed("terms", term("WS2024")).await.unwrap();
        let mut session = store.begin().await.unwrap();
        assert_eq!(session.update("terms", 1, &term("SS2024")).await.unwrap(), 1);
        assert_eq!(session.update("terms", 9, &term("SS2024")).await.unwrap(), 0);
        session.commit().await.unwrap();

        let rows = store.select_all("terms").await.unwrap();
        assert_eq!(rows[0].get("termName"), Some(&Value::from("SS2024")));
    }

    #[tokio::test]
    async fn updated_rows_move_to_the_end() {
        let store = MemoryStore::new();
        for name in ["WS2023/24", "SS2024", "WS2024/25"] {
            store.seed("terms", term(name)).await.unwrap();
        }
        let mut session = store.begin().await.unwrap();
        session.update("terms", 1, &term("WS2023/24")).await.unwrap();
        session.commit().await.unwrap();

        let ids: Vec<_> = store
            .select_all("terms")
            .await
            .unwrap()
            .iter()
            .map(|row| row.id().unwrap())
            .collect();
        assert_eq!(ids, [2, 3, 1]);
    }

    #[tokio::test]
    async fn null_never_matches() {
        let store = MemoryStore::new();
        store
            .seed("terms", Row::new().with("termName", Value::Text(None)))
            .await
            .unwrap();
        let rows = store
            .select_where("terms", "termName", &Value::Text(None))
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn counts_selects() {
        let store = MemoryStore::new();
        store.select_all("terms").await.unwrap();
        store.select_where("courses", "termId", &Value::from(1)).await.unwrap();
        assert_eq!(store.select_count(), 2);
        store.reset_select_count();
        assert_eq!(store.select_count(), 0);
    }
}
