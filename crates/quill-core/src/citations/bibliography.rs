//! Rendered bibliography and its layout rules

use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Header element placed before every rendered bibliography
pub const BIBLIOGRAPHY_HEADER: &str = r#"<h1 class="article-bibliography-header"></h1>"#;

/// Layout metadata reported by the style processor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BibliographyStyle {
    /// Space below each entry, in em
    pub entry_spacing: f64,
    pub line_spacing: f64,
    /// Hanging indent in em; absent or zero means none
    pub hanging_indent: Option<f64>,
    /// `flush` or `margin` when the style aligns the second field
    pub second_field_align: Option<String>,
    pub wrapper_start: String,
    pub wrapper_end: String,
}

impl Default for BibliographyStyle {
    fn default() -> Self {
        Self {
            entry_spacing: 1.0,
            line_spacing: 1.0,
            hanging_indent: None,
            second_field_align: None,
            wrapper_start: r#"<div class="csl-bib-body">"#.to_string(),
            wrapper_end: "</div>".to_string(),
        }
    }
}

impl BibliographyStyle {
    /// Entries use a separate right-hand block for everything after the first field
    pub fn aligns_second_field(&self) -> bool {
        matches!(self.second_field_align.as_deref(), Some("flush") | Some("margin"))
    }
}

/// A bibliography regenerated in full on every formatting pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bibliography {
    /// `(item id, html fragment)` in the order the processor emitted them
    pub entries: Vec<(String, String)>,
    pub style: BibliographyStyle,
}

impl Bibliography {
    pub fn new(entries: Vec<(String, String)>, style: BibliographyStyle) -> Self {
        Self { entries, style }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn html(&self) -> String {
        let mut html = String::from(BIBLIOGRAPHY_HEADER);
        html.push_str(&self.style.wrapper_start);
        for (_, fragment) in &self.entries {
            html.push_str(fragment);
        }
        html.push_str(&self.style.wrapper_end);
        html
    }

    pub fn css(&self) -> String {
        let style = &self.style;
        let mut css = String::from("\n");
        let _ = writeln!(css, ".csl-entry {{margin-bottom: {}em;}}", style.entry_spacing);
        let _ = writeln!(css, ".csl-bib-body {{line-height: {};}}", style.line_spacing);

        if let Some(indent) = style.hanging_indent.filter(|i| *i != 0.0) {
            let selector = if style.aligns_second_field() {
                ".csl-right-inline"
            } else {
                ".csl-entry"
            };
            let _ = writeln!(
                css,
                "{selector} {{text-indent:{}em; margin-left:{}em;}}",
                -indent, indent
            );
        }
        css
    }
}
