//! In-process cache with an optional size quota

use std::collections::HashMap;
use std::sync::Mutex;

use super::{CacheError, LocalCache};

/// Cache kept in memory for the lifetime of the process.
///
/// A quota bounds the total size of stored values, mirroring the storage
/// limits of browser-style key/value stores.
#[derive(Debug, Default)]
pub struct MemoryCache {
    values: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache refusing writes that would push the stored values past `quota` bytes
    pub fn with_quota(quota: usize) -> Self {
        Self {
            values: Mutex::new(HashMap::new()),
            quota: Some(quota),
        }
    }
}

impl LocalCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let values = self.values.lock().expect("memory cache lock poisoned");
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let mut values = self.values.lock().expect("memory cache lock poisoned");
        if let Some(quota) = self.quota {
            let used: usize = values
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            let available = quota.saturating_sub(used);
            if value.len() > available {
                return Err(CacheError::QuotaExceeded {
                    needed: value.len(),
                    available,
                });
            }
        }
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        let mut values = self.values.lock().expect("memory cache lock poisoned");
        values.remove(key);
        Ok(())
    }
}
