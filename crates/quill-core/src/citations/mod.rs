//! Citation formatting
//!
//! - `placeholder`: citations as they appear in document content
//! - `engine`: the contract with the external style processor and the style registry
//! - `connector`: store entries shaped as CSL items
//! - `formatter`: formatting passes with the missing-entry reload
//! - `bibliography`: bibliography HTML and CSS

pub mod bibliography;
pub mod connector;
pub mod engine;
pub mod formatter;
pub mod placeholder;

pub use bibliography::{Bibliography, BibliographyStyle, BIBLIOGRAPHY_HEADER};
pub use connector::{resolve_entry, to_csl_item, CslItem, StyleSourceConnector};
pub use engine::{
    CitationEngine, CitationItemRequest, CitationRequest, ClusterUpdate, EngineFactory,
    ItemSource, StyleClass, StyleDefinition, StyleRegistry,
};
pub use formatter::{CitationFormatter, FormattedCitation, FormattedOutput};
pub use placeholder::{CitationMode, CitationPlaceholder};
