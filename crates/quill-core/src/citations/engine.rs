//! Contract with the external citation-style processor
//!
//! The processor itself (a CSL implementation) is not part of this crate.
//! It is plugged in through `EngineFactory`, built once per formatting pass
//! against a style definition and an `ItemSource`, and driven in document
//! order because numbering styles keep state between calls.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::bibliography::Bibliography;
use super::connector::CslItem;

/// One cited item in the processor's input shape
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationItemRequest {
    pub id: String,
    /// Locator value, e.g. `"42-45"`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,
    /// Locator type, e.g. `"page"`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    #[serde(rename = "suppress-author", default, skip_serializing_if = "is_false")]
    pub suppress_author: bool,
    #[serde(rename = "author-only", default, skip_serializing_if = "is_false")]
    pub author_only: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl CitationItemRequest {
    /// The author part of a textcite split: only the id survives
    pub fn author_only(&self) -> Self {
        Self {
            id: self.id.clone(),
            author_only: true,
            ..Self::default()
        }
    }

    /// The date part of a textcite split, keeping locator and affixes
    pub fn suppress_author(&self) -> Self {
        Self {
            id: self.id.clone(),
            locator: self.locator.clone(),
            label: self.label.clone(),
            prefix: self.prefix.clone(),
            suffix: self.suffix.clone(),
            suppress_author: true,
            author_only: false,
        }
    }
}

/// A citation cluster with its 1-based note index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationRequest {
    #[serde(rename = "citationItems")]
    pub items: Vec<CitationItemRequest>,
    #[serde(rename = "noteIndex")]
    pub note_index: usize,
}

/// Text of a previously appended cluster, identified by its position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterUpdate {
    pub index: usize,
    pub text: String,
}

/// Whether a style cites in running text or in notes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StyleClass {
    InText,
    Note,
}

impl StyleClass {
    pub fn parse(s: &str) -> Self {
        match s {
            "note" => StyleClass::Note,
            _ => StyleClass::InText,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StyleClass::InText => "in-text",
            StyleClass::Note => "note",
        }
    }
}

/// A registered citation style
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleDefinition {
    pub id: String,
    pub title: String,
    /// CSL style document
    pub definition: String,
}

impl StyleDefinition {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        definition: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            definition: definition.into(),
        }
    }
}

/// Available styles in registration order
#[derive(Debug, Clone, Default)]
pub struct StyleRegistry {
    styles: Vec<StyleDefinition>,
}

impl StyleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a style; an existing style with the same id is replaced in place
    pub fn register(&mut self, style: StyleDefinition) {
        match self.styles.iter_mut().find(|s| s.id == style.id) {
            Some(existing) => *existing = style,
            None => self.styles.push(style),
        }
    }

    pub fn with_style(mut self, style: StyleDefinition) -> Self {
        self.register(style);
        self
    }

    pub fn get(&self, id: &str) -> Option<&StyleDefinition> {
        self.styles.iter().find(|s| s.id == id)
    }

    /// The style named `id`, or the first registered style when it is unknown
    pub fn resolve(&self, id: &str) -> Option<&StyleDefinition> {
        self.get(id).or_else(|| {
            let fallback = self.styles.first();
            if let Some(style) = fallback {
                tracing::warn!(
                    requested = id,
                    using = %style.id,
                    "Unknown citation style, falling back"
                );
            }
            fallback
        })
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.styles.iter().map(|s| s.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

/// Entry lookup offered to the processor
pub trait ItemSource: Send + Sync {
    /// The item for citation id `id`, or `None` when it cannot be resolved
    fn retrieve_item(&self, id: &str) -> Option<CslItem>;
}

/// A style processor instance bound to one style and one item source
pub trait CitationEngine: Send {
    fn style_class(&self) -> StyleClass;

    /// Add a cluster to the document's citation sequence. Returns the text of
    /// the new cluster and of any earlier clusters whose rendering changed.
    fn append_citation_cluster(&mut self, citation: &CitationRequest) -> Vec<ClusterUpdate>;

    /// Render items without adding them to the citation sequence
    fn make_citation_cluster(&mut self, items: &[CitationItemRequest]) -> String;

    /// Render the bibliography for every item cited so far
    fn make_bibliography(&mut self) -> Bibliography;
}

/// Creates engine instances
pub trait EngineFactory: Send + Sync {
    fn build(
        &self,
        style: &StyleDefinition,
        source: Arc<dyn ItemSource>,
    ) -> Box<dyn CitationEngine>;
}
