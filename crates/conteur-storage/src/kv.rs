// SPDX-FileCopyrightText: 2026 Conteur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`KvStore`] trait.
//!
//! The usage ledger treats storage as a plain string-keyed store; this
//! adapter maps `get`/`put` onto the `kv` table with an upsert.

use async_trait::async_trait;
use rusqlite::params;

use conteur_core::{ConteurError, KvStore};

use crate::database::{map_tr_err, Database};

/// SQLite-backed key-value store.
#[derive(Clone)]
pub struct SqliteKv {
    db: Database,
}

impl SqliteKv {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl KvStore for SqliteKv {
    async fn get(&self, key: &str) -> Result<Option<String>, ConteurError> {
        let key = key.to_string();
        self.db
            .connection()
            .call(move |conn| {
                let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
                let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
                match result {
                    Ok(value) => Ok(Some(value)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(map_tr_err)
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), ConteurError> {
        let key = key.to_string();
        let value = value.to_string();
        self.db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO kv (key, value, updated_at)
                     VALUES (?1, ?2, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                     ON CONFLICT(key) DO UPDATE SET
                         value = excluded.value,
                         updated_at = excluded.updated_at",
                    params![key, value],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup() -> (SqliteKv, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("kv.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        (SqliteKv::new(db), dir)
    }

    #[tokio::test]
    async fn get_missing_key_returns_none() {
        let (kv, _dir) = setup().await;
        assert_eq!(kv.get("usage_2026-08-25").await.unwrap(), None);
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let (kv, _dir) = setup().await;
        kv.put("usage_2026-08-25", r#"{"totalCost":0.5}"#)
            .await
            .unwrap();
        assert_eq!(
            kv.get("usage_2026-08-25").await.unwrap().as_deref(),
            Some(r#"{"totalCost":0.5}"#)
        );
    }

    #[tokio::test]
    async fn put_overwrites_existing_value() {
        let (kv, _dir) = setup().await;
        kv.put("k", "first").await.unwrap();
        kv.put("k", "second").await.unwrap();
        assert_eq!(kv.get("k").await.unwrap().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let (kv, _dir) = setup().await;
        kv.put("usage_2026-08-24", "a").await.unwrap();
        kv.put("usage_2026-08-25", "b").await.unwrap();
        assert_eq!(
            kv.get("usage_2026-08-24").await.unwrap().as_deref(),
            Some("a")
        );
        assert_eq!(
            kv.get("usage_2026-08-25").await.unwrap().as_deref(),
            Some("b")
        );
    }
}
