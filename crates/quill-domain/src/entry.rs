//! Bibliography entry representation

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Server-assigned entry id. Zero or negative ids are temporary placeholders
/// used before the first save.
pub type EntryId = i64;

/// Category id, scoped to one bibliography owner.
pub type CategoryId = i64;

/// Owner of a bibliography (a user, or `0` for the shared default owner).
pub type OwnerId = i64;

/// Structured entry fields keyed by field name.
///
/// Values are kept as JSON so that author lists, date strings and rich text
/// survive unchanged; key order is preserved.
pub type FieldMap = serde_json::Map<String, serde_json::Value>;

/// Bibliographic entry type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BibType {
    Article,
    Book,
    Booklet,
    InBook,
    InCollection,
    InProceedings,
    Proceedings,
    Manual,
    Thesis,
    MastersThesis,
    PhdThesis,
    Report,
    TechReport,
    Online,
    Patent,
    Unpublished,
    Misc,
    /// Any type name this crate does not know; kept verbatim.
    Other(String),
}

impl BibType {
    /// Parse an entry type name. Unknown names are preserved as `Other`.
    pub fn parse(s: &str) -> Self {
        match s {
            "article" => Self::Article,
            "book" => Self::Book,
            "booklet" => Self::Booklet,
            "inbook" => Self::InBook,
            "incollection" => Self::InCollection,
            "inproceedings" => Self::InProceedings,
            "proceedings" => Self::Proceedings,
            "manual" => Self::Manual,
            "thesis" => Self::Thesis,
            "mastersthesis" => Self::MastersThesis,
            "phdthesis" => Self::PhdThesis,
            "report" => Self::Report,
            "techreport" => Self::TechReport,
            "online" => Self::Online,
            "patent" => Self::Patent,
            "unpublished" => Self::Unpublished,
            "misc" => Self::Misc,
            other => Self::Other(other.to_string()),
        }
    }

    /// Canonical name, as stored on the server
    pub fn as_str(&self) -> &str {
        match self {
            Self::Article => "article",
            Self::Book => "book",
            Self::Booklet => "booklet",
            Self::InBook => "inbook",
            Self::InCollection => "incollection",
            Self::InProceedings => "inproceedings",
            Self::Proceedings => "proceedings",
            Self::Manual => "manual",
            Self::Thesis => "thesis",
            Self::MastersThesis => "mastersthesis",
            Self::PhdThesis => "phdthesis",
            Self::Report => "report",
            Self::TechReport => "techreport",
            Self::Online => "online",
            Self::Patent => "patent",
            Self::Unpublished => "unpublished",
            Self::Misc => "misc",
            Self::Other(name) => name,
        }
    }

    /// The CSL item type a citation-style processor expects for this entry type
    pub fn csl_type(&self) -> &'static str {
        match self {
            Self::Article => "article-journal",
            Self::Book | Self::Booklet | Self::Proceedings => "book",
            Self::InBook | Self::InCollection => "chapter",
            Self::InProceedings => "paper-conference",
            Self::Manual => "book",
            Self::Thesis | Self::MastersThesis | Self::PhdThesis => "thesis",
            Self::Report | Self::TechReport => "report",
            Self::Online => "webpage",
            Self::Patent => "patent",
            Self::Unpublished => "manuscript",
            Self::Misc | Self::Other(_) => "article",
        }
    }
}

impl fmt::Display for BibType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl Serialize for BibType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BibType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::parse(&name))
    }
}

/// A single bibliographic record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BibEntry {
    pub id: EntryId,
    pub fields: FieldMap,
    pub bib_type: BibType,
    /// Human-readable citation key, expected to be unique per owner
    pub entry_key: String,
    /// Ids of the categories this entry belongs to
    pub entry_cat: Vec<CategoryId>,
}

impl BibEntry {
    /// Create an entry with no fields and no categories
    pub fn new(id: EntryId, bib_type: BibType, entry_key: impl Into<String>) -> Self {
        Self {
            id,
            fields: FieldMap::new(),
            bib_type,
            entry_key: entry_key.into(),
            entry_cat: Vec::new(),
        }
    }

    /// Builder: set a field
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Builder: set the category ids
    pub fn with_categories(mut self, categories: Vec<CategoryId>) -> Self {
        self.entry_cat = categories;
        self
    }

    /// Get a field value by name
    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.fields.get(name)
    }

    /// Get a field value if it is a plain string
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.as_str())
    }

    /// Whether this entry still carries a temporary id
    pub fn is_temporary(&self) -> bool {
        self.id <= 0
    }

    pub fn in_category(&self, category: CategoryId) -> bool {
        self.entry_cat.contains(&category)
    }
}
