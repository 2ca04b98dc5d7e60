//! Local bibliography cache
//!
//! The cache holds the last full entry list downloaded for an owner plus a
//! fingerprint (`last_modified`, entry count, owner, format version). The
//! fingerprint is sent with the next list request; when the server finds it
//! current, the entry list is read back from the cache instead of being
//! downloaded again.
//!
//! Cache failures never fail a sync: reads degrade to a full fetch and
//! writes are dropped.

mod file;
mod memory;

pub use file::FileCache;
pub use memory::MemoryCache;

use std::sync::Arc;
use thiserror::Error;

use quill_domain::OwnerId;

use crate::sync::ServerBibItem;

/// Compatibility tag of the cached data; a mismatch forces a full fetch
pub const CACHE_VERSION: &str = "1.0";

/// Sentinel sent for `last_modified` and entry count when a full fetch is required
pub const FULL_FETCH: i64 = -1;

/// Cache keys
pub mod keys {
    pub const BIB_LIST: &str = "biblist";
    pub const LAST_MODIFIED: &str = "last_modified_biblist";
    pub const ENTRY_COUNT: &str = "number_of_entries";
    pub const OWNER_ID: &str = "owner_id";
    pub const VERSION: &str = "version";
}

/// Errors from the local cache
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache data is malformed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cache quota exceeded: needed {needed} bytes, {available} available")]
    QuotaExceeded { needed: usize, available: usize },
}

/// String key/value storage that survives between sessions
pub trait LocalCache: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;

    fn remove(&self, key: &str) -> Result<(), CacheError>;
}

/// Persisted description of the cached bibliography snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub last_modified: i64,
    pub entry_count: i64,
    pub version: Option<String>,
    pub owner_id: Option<OwnerId>,
}

impl Fingerprint {
    /// Whether this snapshot may be offered to the server for `owner_id`
    pub fn is_valid_for(&self, owner_id: OwnerId) -> bool {
        self.version.as_deref() == Some(CACHE_VERSION) && self.owner_id == Some(owner_id)
    }
}

/// Bibliography-specific view over a `LocalCache`
#[derive(Clone)]
pub struct BibCache {
    inner: Arc<dyn LocalCache>,
}

impl BibCache {
    pub fn new(inner: Arc<dyn LocalCache>) -> Self {
        Self { inner }
    }

    fn read_number(&self, key: &str) -> Result<Option<i64>, CacheError> {
        Ok(self
            .inner
            .get(key)?
            .and_then(|v| v.trim().parse::<i64>().ok()))
    }

    /// Read the stored fingerprint. Missing or unparseable numbers become the
    /// full-fetch sentinel.
    pub fn fingerprint(&self) -> Result<Fingerprint, CacheError> {
        Ok(Fingerprint {
            last_modified: self.read_number(keys::LAST_MODIFIED)?.unwrap_or(FULL_FETCH),
            entry_count: self.read_number(keys::ENTRY_COUNT)?.unwrap_or(FULL_FETCH),
            version: self.inner.get(keys::VERSION)?,
            owner_id: self.read_number(keys::OWNER_ID)?,
        })
    }

    /// `(last_modified, entry_count)` to send with a list request for `owner_id`
    pub fn validation_hint(&self, owner_id: OwnerId) -> (i64, i64) {
        match self.fingerprint() {
            Ok(fp) if fp.is_valid_for(owner_id) => (fp.last_modified, fp.entry_count),
            Ok(_) => (FULL_FETCH, FULL_FETCH),
            Err(e) => {
                tracing::debug!("Bibliography cache unreadable, requesting full list: {}", e);
                (FULL_FETCH, FULL_FETCH)
            }
        }
    }

    /// The cached entry list, if one was stored
    pub fn load_entries(&self) -> Result<Option<Vec<ServerBibItem>>, CacheError> {
        match self.inner.get(keys::BIB_LIST)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Store a full entry list and its fingerprint.
    ///
    /// The list is written first; if it does not fit, the previous
    /// fingerprint stays in place and still describes the previous list.
    pub fn store_entries(
        &self,
        items: &[ServerBibItem],
        last_modified: i64,
        entry_count: i64,
        owner_id: OwnerId,
    ) -> Result<(), CacheError> {
        let raw = serde_json::to_string(items)?;
        self.inner.set(keys::BIB_LIST, &raw)?;
        self.inner
            .set(keys::LAST_MODIFIED, &last_modified.to_string())?;
        self.inner.set(keys::ENTRY_COUNT, &entry_count.to_string())?;
        self.inner.set(keys::OWNER_ID, &owner_id.to_string())?;
        self.inner.set(keys::VERSION, CACHE_VERSION)?;
        Ok(())
    }

    /// Drop the compatibility tag so the next sync performs a full fetch
    pub fn invalidate(&self) {
        if let Err(e) = self.inner.remove(keys::VERSION) {
            tracing::debug!("Could not invalidate bibliography cache: {}", e);
        }
    }
}
