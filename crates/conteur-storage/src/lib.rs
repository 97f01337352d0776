// SPDX-FileCopyrightText: 2026 Conteur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Conteur backend.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, a key-value store backing the
//! usage ledger, and email signup queries.

pub mod database;
pub mod kv;
pub mod migrations;
pub mod subscribers;

pub use database::Database;
pub use kv::SqliteKv;
pub use subscribers::Subscriber;
