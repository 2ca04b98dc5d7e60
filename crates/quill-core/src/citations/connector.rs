//! Store entries shaped for a CSL processor
//!
//! Field names follow the bibliography's BibLaTeX-like vocabulary; the
//! connector renames them to CSL variables, parses names and dates, and
//! flattens rich-text values to plain strings.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};

use quill_domain::{names_from_value, parse_date, BibEntry, EntryId, StoreHandle};

use super::engine::ItemSource;

/// An item in CSL-JSON form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CslItem {
    pub id: String,
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(flatten)]
    pub variables: Map<String, Value>,
}

impl CslItem {
    pub fn get(&self, variable: &str) -> Option<&Value> {
        self.variables.get(variable)
    }
}

const NAME_FIELDS: &[(&str, &str)] = &[
    ("author", "author"),
    ("editor", "editor"),
    ("translator", "translator"),
    ("bookauthor", "container-author"),
    ("holder", "author"),
];

const DATE_FIELDS: &[(&str, &str)] = &[
    ("date", "issued"),
    ("urldate", "accessed"),
    ("origdate", "original-date"),
    ("eventdate", "event-date"),
];

const TEXT_FIELDS: &[(&str, &str)] = &[
    ("journaltitle", "container-title"),
    ("booktitle", "container-title"),
    ("maintitle", "container-title"),
    ("shortjournal", "container-title-short"),
    ("shorttitle", "title-short"),
    ("pages", "page"),
    ("pagetotal", "number-of-pages"),
    ("doi", "DOI"),
    ("url", "URL"),
    ("isbn", "ISBN"),
    ("issn", "ISSN"),
    ("location", "publisher-place"),
    ("publisher", "publisher"),
    ("institution", "publisher"),
    ("organization", "publisher"),
    ("school", "publisher"),
    ("volume", "volume"),
    ("number", "number"),
    ("issue", "issue"),
    ("edition", "edition"),
    ("series", "collection-title"),
    ("eventtitle", "event"),
    ("venue", "event-place"),
    ("abstract", "abstract"),
    ("note", "note"),
    ("language", "language"),
    ("version", "version"),
];

/// Plain text of a field value. Rich-text values are arrays of strings or of
/// `{"text": ..}` nodes, possibly nested under `content`.
fn text_of(value: &Value) -> Option<String> {
    fn collect(value: &Value, out: &mut String) {
        match value {
            Value::String(s) => out.push_str(s),
            Value::Number(n) => out.push_str(&n.to_string()),
            Value::Array(items) => items.iter().for_each(|v| collect(v, out)),
            Value::Object(obj) => {
                if let Some(text) = obj.get("text") {
                    collect(text, out);
                }
                if let Some(content) = obj.get("content") {
                    collect(content, out);
                }
            }
            _ => {}
        }
    }

    let mut out = String::new();
    collect(value, &mut out);
    let trimmed = out.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Shape one entry into a CSL item with citation id `id`
pub fn to_csl_item(id: &str, entry: &BibEntry) -> CslItem {
    let mut variables = Map::new();

    let title = entry.field("title").and_then(text_of);
    let subtitle = entry.field("subtitle").and_then(text_of);
    match (title, subtitle) {
        (Some(title), Some(subtitle)) => {
            variables.insert("title".into(), Value::String(format!("{title}: {subtitle}")));
        }
        (Some(title), None) => {
            variables.insert("title".into(), Value::String(title));
        }
        (None, Some(subtitle)) => {
            variables.insert("title".into(), Value::String(subtitle));
        }
        (None, None) => {}
    }

    for (field, variable) in NAME_FIELDS {
        if variables.contains_key(*variable) {
            continue;
        }
        let names = entry.field(field).map(names_from_value).unwrap_or_default();
        if !names.is_empty() {
            if let Ok(value) = serde_json::to_value(names) {
                variables.insert((*variable).into(), value);
            }
        }
    }

    for (field, variable) in DATE_FIELDS {
        let Some(date) = entry
            .field(field)
            .and_then(text_of)
            .and_then(|s| parse_date(&s))
        else {
            continue;
        };
        if let Ok(value) = serde_json::to_value(date) {
            variables.insert((*variable).into(), value);
        }
    }

    for (field, variable) in TEXT_FIELDS {
        if variables.contains_key(*variable) {
            continue;
        }
        if let Some(text) = entry.field(field).and_then(text_of) {
            variables.insert((*variable).into(), Value::String(text));
        }
    }

    CslItem {
        id: id.to_string(),
        item_type: entry.bib_type.csl_type().to_string(),
        variables,
    }
}

/// Look up a citation id: decimal ids are tried as entry ids first, then
/// every id is tried as an entry key
pub fn resolve_entry(store: &StoreHandle, id: &str) -> Option<BibEntry> {
    id.trim()
        .parse::<EntryId>()
        .ok()
        .and_then(|entry_id| store.get(entry_id))
        .or_else(|| store.read(|s| s.find_by_key(id).cloned()))
}

/// Resolves citation ids against a store and remembers the ones it could not find
#[derive(Debug, Clone)]
pub struct StyleSourceConnector {
    store: StoreHandle,
    missing: Arc<Mutex<Vec<String>>>,
}

impl StyleSourceConnector {
    pub fn new(store: StoreHandle) -> Self {
        Self {
            store,
            missing: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn lookup(&self, id: &str) -> Option<BibEntry> {
        resolve_entry(&self.store, id)
    }

    /// Ids requested but not found, in request order; may contain repeats
    pub fn missing_items(&self) -> Vec<String> {
        self.missing
            .lock()
            .expect("missing items lock poisoned")
            .clone()
    }

    pub fn has_missing(&self) -> bool {
        !self
            .missing
            .lock()
            .expect("missing items lock poisoned")
            .is_empty()
    }

    /// Whether any of `ids` resolves against the store now
    pub fn any_present(&self, ids: &[String]) -> bool {
        ids.iter().any(|id| self.lookup(id).is_some())
    }
}

impl ItemSource for StyleSourceConnector {
    fn retrieve_item(&self, id: &str) -> Option<CslItem> {
        match self.lookup(id) {
            Some(entry) => Some(to_csl_item(id, &entry)),
            None => {
                tracing::debug!(id, "Citation refers to an entry not in the store");
                self.missing
                    .lock()
                    .expect("missing items lock poisoned")
                    .push(id.to_string());
                None
            }
        }
    }
}
