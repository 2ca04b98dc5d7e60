//! Bibliography domain types shared by the quill editor crates
//!
//! This crate provides the in-memory models for a writer's bibliography:
//! - BibEntry: a single bibliographic record with opaque, structured fields
//! - BibCategory: a user-defined grouping of entries
//! - BibEntryStore: the per-session collection of entries and categories
//! - SyncHistory: the capped record of completed syncs
//! - StoreHandle: shared ownership of a store with change subscriptions
//! - Name and date shaping for citation-style processors

pub mod category;
pub mod date;
pub mod entry;
pub mod handle;
pub mod history;
pub mod name;
pub mod store;

pub use category::*;
pub use date::*;
pub use entry::*;
pub use handle::*;
pub use history::*;
pub use name::*;
pub use store::*;
