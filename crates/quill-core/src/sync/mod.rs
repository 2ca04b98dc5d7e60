//! Synchronization of the local bibliography store with the server

mod client;
mod service;
pub mod wire;

pub use client::{BibSyncClient, SyncOutcome};
pub use service::BibliographyService;
pub use wire::{
    CategorySaveReply, ListRequest, ListResponse, SaveItem, SaveRequest, SaveResponse,
    ServerBibItem, WireError,
};
