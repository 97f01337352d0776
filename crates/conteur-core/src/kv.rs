// SPDX-FileCopyrightText: 2026 Conteur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value store trait for the usage ledger's persistence seam.

use async_trait::async_trait;

use crate::error::ConteurError;

/// Narrow read-modify-write seam over an external key-value store.
///
/// The usage ledger is the only consumer. Values are opaque JSON strings;
/// `put` overwrites unconditionally (last writer wins).
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Fetch the value stored under `key`, or `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<String>, ConteurError>;

    /// Store `value` under `key`, overwriting any existing value.
    async fn put(&self, key: &str, value: &str) -> Result<(), ConteurError>;
}
