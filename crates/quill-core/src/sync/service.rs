//! Request/response contract of the remote bibliography service

use async_trait::async_trait;

use quill_domain::{CategoryId, CategoryUpdate, EntryId};

use super::wire::{CategorySaveReply, ListRequest, ListResponse, SaveRequest, SaveResponse};
use crate::error::SyncError;

/// The server-side source of truth for an owner's bibliography.
///
/// Implementations perform exactly one request per call and never touch
/// the local store; timeouts and cancellation belong to the transport.
#[async_trait]
pub trait BibliographyService: Send + Sync {
    /// Fetch categories and, unless the cache hint is current, all entries
    async fn list(&self, request: &ListRequest) -> Result<ListResponse, SyncError>;

    /// Create or update entries in bulk
    async fn save_entries(&self, request: &SaveRequest) -> Result<SaveResponse, SyncError>;

    /// Create or rename categories in bulk
    async fn save_categories(&self, update: &CategoryUpdate)
        -> Result<CategorySaveReply, SyncError>;

    async fn delete_categories(&self, ids: &[CategoryId]) -> Result<(), SyncError>;

    async fn delete_entries(&self, ids: &[EntryId]) -> Result<(), SyncError>;
}
