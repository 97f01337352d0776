// SPDX-FileCopyrightText: 2026 Conteur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory test doubles for the `KvStore` seam.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use conteur_core::{ConteurError, KvStore};

/// In-memory KV store backed by a mutexed map.
#[derive(Default)]
pub(crate) struct MemoryKv {
    entries: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>, ConteurError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), ConteurError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// KV store whose every operation fails, for store-outage paths.
pub(crate) struct FailingKv;

#[async_trait]
impl KvStore for FailingKv {
    async fn get(&self, _key: &str) -> Result<Option<String>, ConteurError> {
        Err(ConteurError::Store {
            source: "kv backend unavailable".into(),
        })
    }

    async fn put(&self, _key: &str, _value: &str) -> Result<(), ConteurError> {
        Err(ConteurError::Store {
            source: "kv backend unavailable".into(),
        })
    }
}
