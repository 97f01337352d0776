// SPDX-FileCopyrightText: 2026 Conteur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Email signup queries.
//!
//! Callers are expected to normalize emails (trim, lowercase) before
//! passing them in; the table stores whatever it is given.

use rusqlite::params;

use conteur_core::ConteurError;

use crate::database::{map_tr_err, Database};

/// A recorded email signup.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscriber {
    pub email: String,
    pub created_at: String,
}

/// Look up a subscriber by email.
pub async fn find_subscriber(
    db: &Database,
    email: &str,
) -> Result<Option<Subscriber>, ConteurError> {
    let email = email.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt =
                conn.prepare("SELECT email, created_at FROM subscribers WHERE email = ?1")?;
            let result = stmt.query_row(params![email], |row| {
                Ok(Subscriber {
                    email: row.get(0)?,
                    created_at: row.get(1)?,
                })
            });
            match result {
                Ok(subscriber) => Ok(Some(subscriber)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Insert a new subscriber. Fails if the email is already present.
pub async fn insert_subscriber(db: &Database, email: &str) -> Result<(), ConteurError> {
    let email = email.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO subscribers (email, created_at)
                 VALUES (?1, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))",
                params![email],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("subs.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn find_missing_subscriber_returns_none() {
        let (db, _dir) = setup().await;
        assert!(find_subscriber(&db, "nobody@example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn insert_then_find_returns_subscriber() {
        let (db, _dir) = setup().await;
        insert_subscriber(&db, "reader@example.com").await.unwrap();
        let found = find_subscriber(&db, "reader@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.email, "reader@example.com");
        assert!(!found.created_at.is_empty());
    }

    #[tokio::test]
    async fn duplicate_insert_fails() {
        let (db, _dir) = setup().await;
        insert_subscriber(&db, "dup@example.com").await.unwrap();
        assert!(insert_subscriber(&db, "dup@example.com").await.is_err());
    }
}
