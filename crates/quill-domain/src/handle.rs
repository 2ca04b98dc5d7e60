//! Shared, observable handle to a bibliography store
//!
//! Dialogs, the citation formatter and the sync client all hold clones of
//! the same handle. Readers always see the current contents, and
//! subscribers receive a `StoreEvent` for every mutation.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex, RwLock};

use crate::{BibCategory, BibEntry, BibEntryStore, CategoryId, EntryId, OwnerId, SyncHistory};

/// A change applied through a `StoreHandle`
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    EntriesUpserted(Vec<EntryId>),
    EntriesRemoved(Vec<EntryId>),
    /// The category list changed; carries the new list
    CategoriesChanged(Vec<BibCategory>),
    Synced(DateTime<Utc>),
}

/// Thread-safe, cloneable handle to a `BibEntryStore`
#[derive(Clone, Debug)]
pub struct StoreHandle {
    store: Arc<RwLock<BibEntryStore>>,
    subscribers: Arc<Mutex<Vec<Sender<StoreEvent>>>>,
}

impl StoreHandle {
    pub fn new(store: BibEntryStore) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a handle to an empty store for `owner_id`
    pub fn for_owner(owner_id: OwnerId) -> Self {
        Self::new(BibEntryStore::new(owner_id))
    }

    /// Run `f` with shared access to the store
    pub fn read<R>(&self, f: impl FnOnce(&BibEntryStore) -> R) -> R {
        let store = self.store.read().expect("bibliography store lock poisoned");
        f(&store)
    }

    fn write<R>(&self, f: impl FnOnce(&mut BibEntryStore) -> R) -> R {
        let mut store = self.store.write().expect("bibliography store lock poisoned");
        f(&mut store)
    }

    /// Subscribe to changes. The receiver is dropped from the list once it hangs up.
    pub fn subscribe(&self) -> Receiver<StoreEvent> {
        let (tx, rx) = channel();
        self.subscribers
            .lock()
            .expect("store subscriber lock poisoned")
            .push(tx);
        rx
    }

    fn publish(&self, event: StoreEvent) {
        let mut subscribers = self
            .subscribers
            .lock()
            .expect("store subscriber lock poisoned");
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Whether `other` is a clone of this handle
    pub fn same_as(&self, other: &StoreHandle) -> bool {
        Arc::ptr_eq(&self.store, &other.store)
    }

    pub fn owner_id(&self) -> OwnerId {
        self.read(|s| s.owner_id())
    }

    pub fn get(&self, id: EntryId) -> Option<BibEntry> {
        self.read(|s| s.get(id).cloned())
    }

    pub fn contains(&self, id: EntryId) -> bool {
        self.read(|s| s.contains(id))
    }

    pub fn len(&self) -> usize {
        self.read(|s| s.len())
    }

    pub fn is_empty(&self) -> bool {
        self.read(|s| s.is_empty())
    }

    /// Snapshot of the current category list
    pub fn categories(&self) -> Vec<BibCategory> {
        self.read(|s| s.categories().to_vec())
    }

    pub fn history(&self) -> SyncHistory {
        self.read(|s| s.history().clone())
    }

    pub fn upsert(&self, entries: impl IntoIterator<Item = (EntryId, BibEntry)>) -> Vec<EntryId> {
        let ids = self.write(|s| s.upsert(entries));
        if !ids.is_empty() {
            self.publish(StoreEvent::EntriesUpserted(ids.clone()));
        }
        ids
    }

    pub fn remove(&self, ids: &[EntryId]) -> BTreeSet<EntryId> {
        let removed = self.write(|s| s.remove(ids));
        if !removed.is_empty() {
            self.publish(StoreEvent::EntriesRemoved(removed.iter().copied().collect()));
        }
        removed
    }

    pub fn replace_categories(&self, categories: Vec<BibCategory>) {
        let snapshot = self.write(|s| {
            s.replace_categories(categories);
            s.categories().to_vec()
        });
        self.publish(StoreEvent::CategoriesChanged(snapshot));
    }

    pub fn append_categories(&self, categories: Vec<BibCategory>) {
        if categories.is_empty() {
            return;
        }
        let snapshot = self.write(|s| {
            s.append_categories(categories);
            s.categories().to_vec()
        });
        self.publish(StoreEvent::CategoriesChanged(snapshot));
    }

    pub fn remove_categories(&self, ids: &[CategoryId]) -> Vec<BibCategory> {
        let (removed, snapshot) = self.write(|s| {
            let removed = s.remove_categories(ids);
            (removed, s.categories().to_vec())
        });
        if !removed.is_empty() {
            self.publish(StoreEvent::CategoriesChanged(snapshot));
        }
        removed
    }

    pub fn record_sync(&self, at: DateTime<Utc>) {
        self.write(|s| s.record_sync(at));
        self.publish(StoreEvent::Synced(at));
    }
}
