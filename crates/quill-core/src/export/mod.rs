//! Bibliography extraction for document export
//!
//! An exported document carries only the entries it cites. Category ids
//! are dropped because they only mean something on the originating server.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use quill_domain::{BibType, FieldMap, StoreHandle};

use crate::citations::{resolve_entry, CitationPlaceholder};

/// An entry as written into an export archive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedEntry {
    pub fields: FieldMap,
    pub bib_type: BibType,
    pub entry_key: String,
}

/// Entries cited by a document, keyed by citation id in first-citation order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsedBibliography {
    pub entries: Vec<(String, ExportedEntry)>,
    /// Cited ids the store could not resolve
    pub missing: Vec<String>,
}

impl UsedBibliography {
    /// Collect every entry cited by `placeholders`
    pub fn collect(placeholders: &[CitationPlaceholder], store: &StoreHandle) -> Self {
        Self::from_ids(
            placeholders
                .iter()
                .flat_map(|p| p.entry_keys.iter().map(String::as_str)),
            store,
        )
    }

    /// Collect the entries for `ids`; repeated ids are kept once
    pub fn from_ids<'a>(ids: impl IntoIterator<Item = &'a str>, store: &StoreHandle) -> Self {
        let mut seen = HashSet::new();
        let mut used = Self::default();
        for id in ids {
            if !seen.insert(id) {
                continue;
            }
            match resolve_entry(store, id) {
                Some(entry) => used.entries.push((
                    id.to_string(),
                    ExportedEntry {
                        fields: entry.fields,
                        bib_type: entry.bib_type,
                        entry_key: entry.entry_key,
                    },
                )),
                None => used.missing.push(id.to_string()),
            }
        }
        if !used.missing.is_empty() {
            tracing::warn!(missing = ?used.missing, "Exporting a document with unresolved citations");
        }
        used
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }

    /// JSON object mapping citation id to entry, in first-citation order
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut map = serde_json::Map::new();
        for (id, entry) in &self.entries {
            map.insert(id.clone(), serde_json::to_value(entry)?);
        }
        serde_json::to_string(&map)
    }
}
