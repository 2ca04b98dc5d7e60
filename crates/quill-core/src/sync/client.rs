//! Bibliography sync client
//!
//! Keeps a `StoreHandle` consistent with the bibliography service. Every
//! operation issues one request and touches the store only after the
//! request succeeded and its payload decoded. Callers must serialize calls
//! per store: overlapping syncs race on upsert order.

use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;

use quill_domain::{
    BibCategory, BibEntry, CategoryId, CategoryUpdate, EntryId, OwnerId, StoreHandle,
};

use super::service::BibliographyService;
use super::wire::{ListRequest, ListResponse, SaveRequest, ServerBibItem};
use crate::cache::BibCache;
use crate::error::SyncError;
use crate::notify::{AlertLevel, Notifier, TracingNotifier, WaitGuard};

/// Result of a successful sync
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncOutcome {
    /// Ids of all entries loaded into the store
    pub new_ids: Vec<EntryId>,
    /// Categories appended to the store
    pub new_categories: Vec<BibCategory>,
    /// The entry list was read from the local cache
    pub from_cache: bool,
}

/// Synchronizes one bibliography store with the remote service
pub struct BibSyncClient {
    service: Arc<dyn BibliographyService>,
    store: StoreHandle,
    cache: Option<BibCache>,
    notifier: Arc<dyn Notifier>,
}

impl BibSyncClient {
    pub fn new(service: Arc<dyn BibliographyService>, store: StoreHandle) -> Self {
        Self {
            service,
            store,
            cache: None,
            notifier: Arc::new(TracingNotifier),
        }
    }

    /// Builder: persist downloaded lists and offer their fingerprint to the server
    pub fn with_cache(mut self, cache: BibCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Builder: route user-facing alerts to `notifier`
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    pub fn has_cache(&self) -> bool {
        self.cache.is_some()
    }

    fn fail(&self, err: SyncError) -> SyncError {
        tracing::warn!("Bibliography request failed: {}", err);
        self.notifier.alert(AlertLevel::Error, &err.user_message());
        err
    }

    async fn fetch_list(&self, request: &ListRequest) -> Result<ListResponse, SyncError> {
        let _wait = WaitGuard::start(self.notifier.as_ref());
        self.service.list(request).await.map_err(|e| self.fail(e))
    }

    fn cache_list(
        cache: &BibCache,
        list: &[ServerBibItem],
        response: &ListResponse,
        owner_id: OwnerId,
    ) {
        let cache_owner = response.owner_id.unwrap_or(owner_id);
        if let Err(e) = cache.store_entries(
            list,
            response.last_modified,
            response.number_of_entries,
            cache_owner,
        ) {
            tracing::debug!("Could not cache bibliography: {}", e);
        }
    }

    /// Sync using the local cache when one is configured
    pub async fn sync(&self) -> Result<SyncOutcome, SyncError> {
        self.sync_with(self.cache.is_some()).await
    }

    /// Load categories and entries from the server into the store.
    ///
    /// With `use_local_cache`, a valid cached fingerprint is sent as a hint;
    /// when the server answers without an entry list, entries are read from
    /// the cache. A cache that turns out empty or unreadable is invalidated
    /// and the full list is requested again.
    pub async fn sync_with(&self, use_local_cache: bool) -> Result<SyncOutcome, SyncError> {
        let owner_id = self.store.owner_id();
        let cache = if use_local_cache { self.cache.as_ref() } else { None };

        let request = match cache {
            Some(cache) => {
                let (last_modified, number_of_entries) = cache.validation_hint(owner_id);
                ListRequest {
                    owner_id,
                    last_modified,
                    number_of_entries,
                }
            }
            None => ListRequest::full(owner_id),
        };
        tracing::debug!(
            owner_id,
            full_fetch = request.is_full_fetch(),
            "Requesting bibliography"
        );

        let mut response = self.fetch_list(&request).await?;

        let mut from_cache = false;
        let items: Vec<ServerBibItem> = match (response.bib_list.take(), cache) {
            (Some(list), Some(cache)) => {
                Self::cache_list(cache, &list, &response, owner_id);
                list
            }
            (Some(list), None) => list,
            (None, Some(cache)) => match cache.load_entries() {
                Ok(Some(list)) => {
                    from_cache = true;
                    list
                }
                unusable => {
                    match unusable {
                        Err(e) => tracing::warn!("Could not read cached bibliography: {}", e),
                        _ => tracing::warn!(
                            "Server reported cached bibliography as current, but the cache is empty"
                        ),
                    }
                    cache.invalidate();
                    response = self.fetch_list(&ListRequest::full(owner_id)).await?;
                    let list = response.bib_list.take().unwrap_or_default();
                    Self::cache_list(cache, &list, &response, owner_id);
                    list
                }
            },
            (None, None) => {
                if request.is_full_fetch() {
                    tracing::warn!("Server omitted the entry list on a full fetch");
                }
                Vec::new()
            }
        };

        let entries = items
            .into_iter()
            .map(ServerBibItem::into_entry)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| self.fail(e.into()))?;

        self.store.record_sync(Utc::now());
        let new_categories = response.bib_categories;
        self.store.append_categories(new_categories.clone());
        let new_ids = self
            .store
            .upsert(entries.into_iter().map(|entry| (entry.id, entry)));

        tracing::info!(
            owner_id,
            entries = new_ids.len(),
            categories = new_categories.len(),
            from_cache,
            "Bibliography synced"
        );

        Ok(SyncOutcome {
            new_ids,
            new_categories,
            from_cache,
        })
    }

    /// Save a single new entry
    pub async fn create_entry(&self, entry: BibEntry) -> Result<Vec<EntryId>, SyncError> {
        self.save_entries(BTreeMap::from([(0, entry)]), true).await
    }

    /// Save entries keyed by temporary id.
    ///
    /// Returns server ids in the order of the server's translations. Saving
    /// the same temporary id from two overlapping calls is not supported.
    pub async fn save_entries(
        &self,
        pending: BTreeMap<EntryId, BibEntry>,
        is_new: bool,
    ) -> Result<Vec<EntryId>, SyncError> {
        let request = SaveRequest::build(&pending, is_new, self.store.owner_id())
            .map_err(|e| self.fail(e.into()))?;
        let response = self
            .service
            .save_entries(&request)
            .await
            .map_err(|e| self.fail(e))?;

        let mut ids = Vec::with_capacity(response.id_translations.len());
        let mut saved = Vec::with_capacity(response.id_translations.len());
        for (temp_id, server_id) in response.id_translations {
            match pending.get(&temp_id) {
                Some(entry) => saved.push((server_id, entry.clone())),
                None => tracing::warn!(temp_id, server_id, "Server translated an unknown temporary id"),
            }
            ids.push(server_id);
        }
        self.store.upsert(saved);

        self.notifier
            .alert(AlertLevel::Success, "The bibliography has been updated.");
        Ok(ids)
    }

    /// Create or rename categories.
    ///
    /// The server answers with the owner's complete category list, which
    /// replaces the store's list. Returns `None` when the server did not
    /// report the categories as created.
    pub async fn save_categories(
        &self,
        update: &CategoryUpdate,
    ) -> Result<Option<Vec<BibCategory>>, SyncError> {
        let reply = {
            let _wait = WaitGuard::start(self.notifier.as_ref());
            self.service
                .save_categories(update)
                .await
                .map_err(|e| self.fail(e))?
        };

        if !reply.created {
            tracing::debug!("Category save answered without 201, keeping categories");
            return Ok(None);
        }

        let mut categories = reply.entries;
        categories.reverse();
        self.store.replace_categories(categories.clone());
        self.notifier
            .alert(AlertLevel::Success, "The categories have been updated");
        Ok(Some(categories))
    }

    /// Delete categories on the server, then locally
    pub async fn delete_categories(
        &self,
        ids: &[CategoryId],
    ) -> Result<Vec<CategoryId>, SyncError> {
        self.service
            .delete_categories(ids)
            .await
            .map_err(|e| self.fail(e))?;
        self.store.remove_categories(ids);
        Ok(ids.to_vec())
    }

    /// Delete entries on the server, then locally
    pub async fn delete_entries(&self, ids: &[EntryId]) -> Result<Vec<EntryId>, SyncError> {
        {
            let _wait = WaitGuard::start(self.notifier.as_ref());
            self.service
                .delete_entries(ids)
                .await
                .map_err(|e| self.fail(e))?;
        }
        self.store.remove(ids);
        self.notifier
            .alert(AlertLevel::Success, "The bibliography item(s) have been deleted");
        Ok(ids.to_vec())
    }
}

impl std::fmt::Debug for BibSyncClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BibSyncClient")
            .field("owner_id", &self.store.owner_id())
            .field("cache", &self.cache.is_some())
            .finish()
    }
}
