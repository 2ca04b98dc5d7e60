//! In-memory bibliography store for one editing session

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};

use crate::{BibCategory, BibEntry, CategoryId, EntryId, OwnerId, SyncHistory};

/// Entries, categories and sync history of one bibliography owner.
///
/// The store performs no validation of entry contents; the server is the
/// authority for uniqueness of entry keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BibEntryStore {
    owner_id: OwnerId,
    entries: BTreeMap<EntryId, BibEntry>,
    categories: Vec<BibCategory>,
    history: SyncHistory,
}

impl BibEntryStore {
    pub fn new(owner_id: OwnerId) -> Self {
        Self {
            owner_id,
            ..Self::default()
        }
    }

    /// Builder: keep `capacity` sync timestamps instead of the default
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history = SyncHistory::with_capacity(capacity);
        self
    }

    pub fn owner_id(&self) -> OwnerId {
        self.owner_id
    }

    /// Merge entries into the store, overwriting by id.
    ///
    /// The map key wins over the id carried inside the entry. Returns the ids
    /// in iteration order of the input.
    pub fn upsert(&mut self, entries: impl IntoIterator<Item = (EntryId, BibEntry)>) -> Vec<EntryId> {
        entries
            .into_iter()
            .map(|(id, mut entry)| {
                entry.id = id;
                self.entries.insert(id, entry);
                id
            })
            .collect()
    }

    /// Insert a single entry under its own id
    pub fn insert(&mut self, entry: BibEntry) -> EntryId {
        let id = entry.id;
        self.entries.insert(id, entry);
        id
    }

    /// Delete entries. Unknown ids are ignored; returns the ids that were present.
    pub fn remove(&mut self, ids: &[EntryId]) -> BTreeSet<EntryId> {
        ids.iter()
            .filter(|id| self.entries.remove(id).is_some())
            .copied()
            .collect()
    }

    pub fn get(&self, id: EntryId) -> Option<&BibEntry> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: EntryId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Look an entry up by its citation key
    pub fn find_by_key(&self, entry_key: &str) -> Option<&BibEntry> {
        self.entries.values().find(|e| e.entry_key == entry_key)
    }

    /// All entries, ordered by id
    pub fn entries(&self) -> impl Iterator<Item = &BibEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn categories(&self) -> &[BibCategory] {
        &self.categories
    }

    /// Swap the whole category list
    pub fn replace_categories(&mut self, categories: Vec<BibCategory>) {
        self.categories = categories;
    }

    /// Append categories without deduplication
    pub fn append_categories(&mut self, categories: impl IntoIterator<Item = BibCategory>) {
        self.categories.extend(categories);
    }

    /// Delete categories by id, returning the removed categories
    pub fn remove_categories(&mut self, ids: &[CategoryId]) -> Vec<BibCategory> {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.categories)
            .into_iter()
            .partition(|c| ids.contains(&c.id));
        self.categories = kept;
        removed
    }

    pub fn history(&self) -> &SyncHistory {
        &self.history
    }

    /// Record a completed sync in the capped history
    pub fn record_sync(&mut self, at: DateTime<Utc>) {
        self.history.record(at);
    }
}
