//! Date values in CSL `date-parts` form

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    /// YYYY, YYYY-MM or YYYY-MM-DD (years may be negative)
    static ref DATE_PART_RE: Regex =
        Regex::new(r"^(-?\d{1,4})(?:-(\d{1,2}))?(?:-(\d{1,2}))?$").unwrap();
}

/// A CSL date: `date-parts` for parseable dates, `literal` otherwise
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CslDate {
    #[serde(rename = "date-parts", skip_serializing_if = "Option::is_none")]
    pub date_parts: Option<Vec<Vec<i32>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub literal: Option<String>,
}

impl CslDate {
    pub fn from_parts(parts: Vec<Vec<i32>>) -> Self {
        Self {
            date_parts: Some(parts),
            literal: None,
        }
    }

    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            date_parts: None,
            literal: Some(text.into()),
        }
    }

    /// Year of the first date in the range, if any
    pub fn year(&self) -> Option<i32> {
        self.date_parts
            .as_ref()
            .and_then(|parts| parts.first())
            .and_then(|first| first.first())
            .copied()
    }
}

fn parse_single(input: &str) -> Option<Vec<i32>> {
    let caps = DATE_PART_RE.captures(input.trim())?;
    let mut parts = Vec::with_capacity(3);
    for idx in 1..=3 {
        match caps.get(idx) {
            Some(m) => parts.push(m.as_str().parse().ok()?),
            None => break,
        }
    }
    Some(parts)
}

/// Parse "2010", "2010-03-12" or a "start/end" range into a CSL date.
///
/// Strings that are not dates become a literal; empty input yields `None`.
pub fn parse_date(input: &str) -> Option<CslDate> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut ranges = Vec::new();
    for part in trimmed.splitn(2, '/') {
        match parse_single(part) {
            Some(parts) => ranges.push(parts),
            None => return Some(CslDate::literal(trimmed)),
        }
    }
    Some(CslDate::from_parts(ranges))
}
