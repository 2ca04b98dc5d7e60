//! In-document citation references prior to styling

use serde::{Deserialize, Serialize};

use super::engine::{CitationItemRequest, CitationRequest};

/// How a citation is displayed in running text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CitationMode {
    /// Parenthetical or note citation, whatever the style produces
    #[default]
    #[serde(alias = "autocite", alias = "cite")]
    Normal,
    /// Author in running text, date and locator in parentheses
    Textcite,
}

impl CitationMode {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "textcite" => CitationMode::Textcite,
            _ => CitationMode::Normal,
        }
    }
}

/// One citation as it appears in document content.
///
/// `locators` and `prefixes` are aligned by position with `entry_keys`; a
/// shorter list means the trailing keys have none.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CitationPlaceholder {
    pub entry_keys: Vec<String>,
    #[serde(default)]
    pub locators: Vec<Option<String>>,
    #[serde(default)]
    pub prefixes: Vec<Option<String>>,
    #[serde(default)]
    pub mode: CitationMode,
}

fn split_attr(value: &str, separator: &str) -> Vec<Option<String>> {
    if value.is_empty() {
        return Vec::new();
    }
    value
        .split(separator)
        .map(|part| (!part.is_empty()).then(|| part.to_string()))
        .collect()
}

impl CitationPlaceholder {
    pub fn new(entry_keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            entry_keys: entry_keys.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Builder: set the locator of the item at `index`
    pub fn with_locator(mut self, index: usize, locator: impl Into<String>) -> Self {
        if self.locators.len() <= index {
            self.locators.resize(index + 1, None);
        }
        self.locators[index] = Some(locator.into());
        self
    }

    /// Builder: set the prefix of the item at `index`
    pub fn with_prefix(mut self, index: usize, prefix: impl Into<String>) -> Self {
        if self.prefixes.len() <= index {
            self.prefixes.resize(index + 1, None);
        }
        self.prefixes[index] = Some(prefix.into());
        self
    }

    pub fn with_mode(mut self, mode: CitationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Build from the attributes of a citation node.
    ///
    /// Ids are comma separated; locators and prefixes are separated by `,,,`
    /// so they may themselves contain commas.
    pub fn from_node_attrs(
        bib_entry: &str,
        bib_page: &str,
        bib_before: &str,
        bib_format: &str,
    ) -> Self {
        let entry_keys = if bib_entry.is_empty() {
            Vec::new()
        } else {
            bib_entry.split(',').map(|k| k.trim().to_string()).collect()
        };
        Self {
            entry_keys,
            locators: split_attr(bib_page, ",,,"),
            prefixes: split_attr(bib_before, ",,,"),
            mode: CitationMode::parse(bib_format),
        }
    }

    pub fn len(&self) -> usize {
        self.entry_keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entry_keys.is_empty()
    }

    fn aligned(values: &[Option<String>], index: usize) -> Option<String> {
        values
            .get(index)
            .and_then(|v| v.as_deref())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// Translate into an engine request. Empty locators and prefixes are
    /// omitted rather than passed as empty strings.
    pub fn to_request(&self, note_index: usize) -> CitationRequest {
        let items = self
            .entry_keys
            .iter()
            .enumerate()
            .map(|(i, key)| CitationItemRequest {
                id: key.clone(),
                locator: Self::aligned(&self.locators, i),
                prefix: Self::aligned(&self.prefixes, i),
                ..CitationItemRequest::default()
            })
            .collect();
        CitationRequest { items, note_index }
    }
}
