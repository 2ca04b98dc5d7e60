//! Personal and institutional names in the shape citation processors expect

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A CSL name: either structured (`family`/`given`) or a `literal`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CslName {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub literal: Option<String>,
}

impl CslName {
    pub fn new(family: impl Into<String>) -> Self {
        Self {
            family: Some(family.into()),
            ..Self::default()
        }
    }

    pub fn literal(name: impl Into<String>) -> Self {
        Self {
            literal: Some(name.into()),
            ..Self::default()
        }
    }

    /// Builder method to add given name
    pub fn with_given(mut self, given: impl Into<String>) -> Self {
        self.given = Some(given.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.family.is_none() && self.given.is_none() && self.literal.is_none()
    }
}

/// Parse a single name written as "Family, Given", "Family, Suffix, Given",
/// "Given Family" or "{Braced Institution}".
pub fn parse_name(input: &str) -> CslName {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return CslName::default();
    }

    // Braces protect institutional names from being split
    if trimmed.starts_with('{') && trimmed.ends_with('}') && trimmed.len() >= 2 {
        return CslName::literal(trimmed[1..trimmed.len() - 1].trim());
    }

    let parts: Vec<&str> = trimmed.split(',').map(str::trim).collect();
    match parts.as_slice() {
        [family, given] => {
            let mut name = CslName::new(*family);
            if !given.is_empty() {
                name.given = Some(given.to_string());
            }
            name
        }
        [family, suffix, given, ..] => {
            let mut name = CslName::new(*family);
            if !given.is_empty() {
                name.given = Some(given.to_string());
            }
            if !suffix.is_empty() {
                name.suffix = Some(suffix.to_string());
            }
            name
        }
        _ => {
            let words: Vec<&str> = trimmed.split_whitespace().collect();
            match words.split_last() {
                Some((family, [])) => CslName::new(*family),
                Some((family, given)) => CslName::new(*family).with_given(given.join(" ")),
                None => CslName::default(),
            }
        }
    }
}

/// Split a name list on " and " and parse each name
pub fn parse_name_list(field: &str) -> Vec<CslName> {
    field
        .split(" and ")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_name)
        .filter(|n| !n.is_empty())
        .collect()
}

/// Shape a name field value of any supported form into CSL names.
///
/// Accepts a plain string name list, an array of strings, or an array of
/// objects with `family`/`given`/`suffix`/`literal` keys. Anything else
/// yields no names.
pub fn names_from_value(value: &Value) -> Vec<CslName> {
    match value {
        Value::String(s) => parse_name_list(s),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(parse_name(s)),
                Value::Object(_) => serde_json::from_value::<CslName>(item.clone()).ok(),
                _ => None,
            })
            .filter(|n| !n.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}
