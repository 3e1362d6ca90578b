//! # Lookup Cache
//!
//! Caller-owned cache for small remote lookup tables, such as the region
//! code to region number mapping some request payloads need. The cache is a
//! plain value: construct one per provider run, pass it by reference, drop
//! it at the end. Entries populate on first miss and never expire within the
//! cache's lifetime.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use crate::remote::RemoteError;

/// Populate-on-miss map from string keys to lookup values.
///
/// Keep one per mapping direction; a bidirectional code/number mapping is
/// two caches side by side on the owning context.
#[derive(Debug, Default)]
pub struct LookupCache<V> {
    entries: Mutex<HashMap<String, V>>,
}

impl<V: Clone> LookupCache<V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Value for `key`, fetching and remembering it on first miss.
    ///
    /// The fetch runs outside the lock, so two tasks missing the same key at
    /// once may both fetch; the later insert wins. The upstream mapping is
    /// immutable, so both fetches return the same value. A failed fetch
    /// caches nothing.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> Result<V, RemoteError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, RemoteError>>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        let value = fetch().await?;
        self.insert(key, value.clone());
        Ok(value)
    }

    /// Cached value for `key`, if present
    #[must_use]
    pub fn get(&self, key: &str) -> Option<V> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    /// Seed or overwrite an entry
    pub fn insert(&self, key: impl Into<String>, value: V) {
        self.entries.lock().unwrap().insert(key.into(), value);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}
