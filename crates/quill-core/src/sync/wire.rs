//! Transport schemas for the bibliography service
//!
//! Structured entry fields travel as JSON-encoded strings. Decoding happens
//! here, at the boundary, so the store only ever holds typed entries.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use quill_domain::{BibCategory, BibEntry, BibType, CategoryId, EntryId, FieldMap, OwnerId};

use crate::cache::FULL_FETCH;

/// Errors converting entries to or from their transport form
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WireError {
    #[error("`{field}` of entry {id} is not valid JSON: {message}")]
    InvalidJson {
        id: EntryId,
        field: &'static str,
        message: String,
    },

    #[error("Could not encode entries: {0}")]
    Encode(String),
}

/// An entry in the form the server stores and sends it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerBibItem {
    pub id: EntryId,
    /// JSON-encoded field map
    pub fields: String,
    pub bib_type: String,
    pub entry_key: String,
    /// JSON-encoded list of category ids
    pub entry_cat: String,
}

impl ServerBibItem {
    /// Decode the string-encoded parts into a store entry
    pub fn into_entry(self) -> Result<BibEntry, WireError> {
        let id = self.id;
        let fields: FieldMap =
            serde_json::from_str(&self.fields).map_err(|e| WireError::InvalidJson {
                id,
                field: "fields",
                message: e.to_string(),
            })?;
        let entry_cat: Vec<CategoryId> =
            serde_json::from_str(&self.entry_cat).map_err(|e| WireError::InvalidJson {
                id,
                field: "entry_cat",
                message: e.to_string(),
            })?;

        Ok(BibEntry {
            id,
            fields,
            bib_type: BibType::parse(&self.bib_type),
            entry_key: self.entry_key,
            entry_cat,
        })
    }

    /// Encode a store entry back into the server's shape
    pub fn from_entry(entry: &BibEntry) -> Result<Self, WireError> {
        let payload = SaveItem::from_entry(entry)?;
        Ok(Self {
            id: entry.id,
            fields: payload.fields,
            bib_type: payload.bib_type,
            entry_key: payload.entry_key,
            entry_cat: payload.entry_cat,
        })
    }
}

/// Parameters of a list request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRequest {
    pub owner_id: OwnerId,
    pub last_modified: i64,
    pub number_of_entries: i64,
}

impl ListRequest {
    /// A request that always receives the full entry list
    pub fn full(owner_id: OwnerId) -> Self {
        Self {
            owner_id,
            last_modified: FULL_FETCH,
            number_of_entries: FULL_FETCH,
        }
    }

    pub fn is_full_fetch(&self) -> bool {
        self.last_modified == FULL_FETCH && self.number_of_entries == FULL_FETCH
    }
}

fn full_fetch() -> i64 {
    FULL_FETCH
}

/// Reply to a list request.
///
/// A missing `bibList` means the client's cached list is current.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResponse {
    #[serde(rename = "bibCategories", default)]
    pub bib_categories: Vec<BibCategory>,
    #[serde(rename = "bibList", default, skip_serializing_if = "Option::is_none")]
    pub bib_list: Option<Vec<ServerBibItem>>,
    #[serde(default = "full_fetch")]
    pub last_modified: i64,
    #[serde(default = "full_fetch")]
    pub number_of_entries: i64,
    #[serde(alias = "docOwnerId", default)]
    pub owner_id: Option<OwnerId>,
}

/// One entry inside a bulk save payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveItem {
    pub fields: String,
    pub bib_type: String,
    pub entry_key: String,
    pub entry_cat: String,
}

impl SaveItem {
    pub fn from_entry(entry: &BibEntry) -> Result<Self, WireError> {
        let fields =
            serde_json::to_string(&entry.fields).map_err(|e| WireError::Encode(e.to_string()))?;
        let entry_cat =
            serde_json::to_string(&entry.entry_cat).map_err(|e| WireError::Encode(e.to_string()))?;
        Ok(Self {
            fields,
            bib_type: entry.bib_type.as_str().to_string(),
            entry_key: entry.entry_key.clone(),
            entry_cat,
        })
    }
}

/// Bulk save request; `bibs` is a JSON-encoded map from temporary id to `SaveItem`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveRequest {
    pub is_new: bool,
    pub bibs: String,
    /// Only sent for owners other than the shared default owner `0`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<OwnerId>,
}

impl SaveRequest {
    pub fn build(
        pending: &BTreeMap<EntryId, BibEntry>,
        is_new: bool,
        owner_id: OwnerId,
    ) -> Result<Self, WireError> {
        let mut bibs = serde_json::Map::new();
        for (temp_id, entry) in pending {
            let item = SaveItem::from_entry(entry)?;
            let value = serde_json::to_value(item).map_err(|e| WireError::Encode(e.to_string()))?;
            bibs.insert(temp_id.to_string(), value);
        }
        let bibs = serde_json::to_string(&bibs).map_err(|e| WireError::Encode(e.to_string()))?;
        Ok(Self {
            is_new,
            bibs,
            owner_id: (owner_id != 0).then_some(owner_id),
        })
    }

    /// Decode `bibs` back into its items, keyed by temporary id
    pub fn items(&self) -> Result<BTreeMap<EntryId, SaveItem>, WireError> {
        let raw: BTreeMap<String, SaveItem> =
            serde_json::from_str(&self.bibs).map_err(|e| WireError::Encode(e.to_string()))?;
        raw.into_iter()
            .map(|(k, v)| {
                k.parse::<EntryId>()
                    .map(|id| (id, v))
                    .map_err(|e| WireError::Encode(format!("bad temporary id {k}: {e}")))
            })
            .collect()
    }
}

/// Reply to a bulk save: `(temporary id, server id)` pairs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveResponse {
    pub id_translations: Vec<(EntryId, EntryId)>,
}

/// Reply to a category save
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorySaveReply {
    /// The server answered `201 Created`
    #[serde(skip)]
    pub created: bool,
    /// Every category of the owner, existing and new
    #[serde(default)]
    pub entries: Vec<BibCategory>,
}
