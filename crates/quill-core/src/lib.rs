//! quill-core: bibliography sync and citation formatting for the quill editor
//!
//! This crate provides:
//! - Sync of a local bibliography store with the server, with a persistent
//!   cache that skips unchanged downloads
//! - Citation formatting through a pluggable CSL processor, including the
//!   reload of entries missing from the store
//! - Bibliography rendering (HTML and CSS) and used-bibliography export
//!
//! Domain types live in `quill-domain` and are re-exported here.

pub mod cache;
pub mod citations;
pub mod config;
pub mod error;
pub mod export;
#[cfg(feature = "native")]
pub mod http;
pub mod notify;
pub mod sync;

pub use cache::{BibCache, CacheError, FileCache, LocalCache, MemoryCache};
pub use citations::{
    Bibliography, CitationEngine, CitationFormatter, CitationMode, CitationPlaceholder,
    EngineFactory, FormattedCitation, FormattedOutput, StyleDefinition, StyleRegistry,
    StyleSourceConnector,
};
pub use config::{ConfigError, QuillConfig};
pub use error::{QuillError, Result, SyncError};
pub use export::UsedBibliography;
#[cfg(feature = "native")]
pub use http::HttpBibliographyService;
pub use notify::{AlertLevel, Notifier, TracingNotifier};
pub use sync::{BibSyncClient, BibliographyService, SyncOutcome};

pub use quill_domain;
