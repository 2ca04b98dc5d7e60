//! Category representation for grouping bibliography entries

use serde::{Deserialize, Serialize};

use crate::CategoryId;

/// A category (folder) owned by one bibliography owner
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibCategory {
    pub id: CategoryId,
    pub title: String,
}

impl BibCategory {
    pub fn new(id: CategoryId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
        }
    }
}

/// A bulk category upsert: ids and titles are paired by position.
///
/// New categories use id `0`; the server assigns the real id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryUpdate {
    pub ids: Vec<CategoryId>,
    pub titles: Vec<String>,
}

impl CategoryUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: rename an existing category
    pub fn rename(mut self, id: CategoryId, title: impl Into<String>) -> Self {
        self.ids.push(id);
        self.titles.push(title.into());
        self
    }

    /// Builder: add a new category
    pub fn create(self, title: impl Into<String>) -> Self {
        self.rename(0, title)
    }

    /// Iterate over `(id, title)` pairs. Unpaired trailing values are ignored.
    pub fn pairs(&self) -> impl Iterator<Item = (CategoryId, &str)> {
        self.ids
            .iter()
            .copied()
            .zip(self.titles.iter().map(String::as_str))
    }

    pub fn len(&self) -> usize {
        self.ids.len().min(self.titles.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
