use rusqlite::Connection;
use std::cell::RefCell;
use std::collections::HashMap;

use crate::db;

/// Durable string-keyed storage for the engine. Writes are fire-and-forget
/// from the engine's point of view; there is no transaction spanning calls.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn put(&self, key: &str, value: &str) -> anyhow::Result<()>;
    fn remove(&self, key: &str) -> anyhow::Result<()>;
}

impl KeyValueStore for Connection {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        db::settings_get(self, key)
    }

    fn put(&self, key: &str, value: &str) -> anyhow::Result<()> {
        db::settings_set(self, key, value)
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        db::settings_delete(self, key)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}
