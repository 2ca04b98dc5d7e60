//! Citation formatting passes
//!
//! A pass turns the document's placeholders into citation text and a
//! bibliography. When the store lacks some cited entries, the formatter may
//! reload the store once and start over:
//!
//! ```text
//! Init -> Formatting -> Complete
//!              |
//!              +-> AwaitingReload -> Init (a missing entry arrived)
//!                        |
//!                        +-> Complete (throttled, failed, or nothing new)
//! ```
//!
//! Every restart resolves at least one previously missing entry and syncs
//! only add entries, so a pass always terminates.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use quill_domain::{StoreHandle, DEFAULT_RELOAD_WINDOW_MS};

use super::bibliography::Bibliography;
use super::connector::StyleSourceConnector;
use super::engine::{
    CitationEngine, CitationRequest, EngineFactory, ItemSource, StyleClass, StyleDefinition,
    StyleRegistry,
};
use super::placeholder::{CitationMode, CitationPlaceholder};
use crate::config::CitationConfig;
use crate::sync::BibSyncClient;

/// Styled text of one placeholder
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedCitation {
    pub display_text: String,
    /// 1-based position of the placeholder in the document
    pub note_index: usize,
}

/// Result of a formatting pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormattedOutput {
    /// One per placeholder, in input order
    pub citations: Vec<FormattedCitation>,
    /// Class of the style used; `None` when no style was available
    pub citation_class: Option<StyleClass>,
    pub bibliography: Bibliography,
    /// Cited ids still missing from the store, first-seen order
    pub unresolved: Vec<String>,
    /// Number of store reloads the pass triggered
    pub reloads: usize,
}

impl FormattedOutput {
    pub fn bibliography_html(&self) -> String {
        self.bibliography.html()
    }

    pub fn bibliography_css(&self) -> String {
        self.bibliography.css()
    }

    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

enum PassState {
    Init,
    Formatting(Vec<CitationRequest>),
    AwaitingReload {
        output: FormattedOutput,
        missing: Vec<String>,
    },
    Complete(FormattedOutput),
}

fn dedup_first_seen(ids: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

/// Formats citations with a pluggable style processor
pub struct CitationFormatter {
    registry: StyleRegistry,
    factory: Arc<dyn EngineFactory>,
    reload_window: chrono::Duration,
    default_style: Option<String>,
}

impl CitationFormatter {
    pub fn new(registry: StyleRegistry, factory: Arc<dyn EngineFactory>) -> Self {
        Self {
            registry,
            factory,
            reload_window: chrono::Duration::milliseconds(DEFAULT_RELOAD_WINDOW_MS),
            default_style: None,
        }
    }

    pub fn from_config(
        registry: StyleRegistry,
        factory: Arc<dyn EngineFactory>,
        config: &CitationConfig,
    ) -> Self {
        let formatter = Self::new(registry, factory).with_reload_window(config.reload_window());
        match &config.default_style {
            Some(style_id) => formatter.with_default_style(style_id.clone()),
            None => formatter,
        }
    }

    /// Builder: minimum time between the second-latest sync and a new reload
    pub fn with_reload_window(mut self, window: chrono::Duration) -> Self {
        self.reload_window = window;
        self
    }

    /// Builder: style used when a document names none
    pub fn with_default_style(mut self, style_id: impl Into<String>) -> Self {
        self.default_style = Some(style_id.into());
        self
    }

    pub fn registry(&self) -> &StyleRegistry {
        &self.registry
    }

    /// Format `placeholders` with style `style_id` against `store`.
    ///
    /// An empty `style_id` selects the default style. `reload` must sync the
    /// same store; without it, missing entries stay unresolved. Always yields
    /// exactly one citation per placeholder.
    pub async fn format(
        &self,
        placeholders: &[CitationPlaceholder],
        style_id: &str,
        store: &StoreHandle,
        reload: Option<&BibSyncClient>,
    ) -> FormattedOutput {
        debug_assert!(
            reload.map_or(true, |client| client.store().same_as(store)),
            "reload client syncs a different store"
        );
        let style_id = match &self.default_style {
            Some(default) if style_id.trim().is_empty() => default.as_str(),
            _ => style_id,
        };
        let Some(style) = self.registry.resolve(style_id) else {
            tracing::warn!(style_id, "No citation styles registered");
            return FormattedOutput {
                citations: (1..=placeholders.len())
                    .map(|note_index| FormattedCitation {
                        display_text: String::new(),
                        note_index,
                    })
                    .collect(),
                ..FormattedOutput::default()
            };
        };

        let mut reloads = 0;
        let mut state = PassState::Init;
        loop {
            state = match state {
                PassState::Init => PassState::Formatting(
                    placeholders
                        .iter()
                        .enumerate()
                        .map(|(i, p)| p.to_request(i + 1))
                        .collect(),
                ),
                PassState::Formatting(requests) => {
                    let connector = Arc::new(StyleSourceConnector::new(store.clone()));
                    let mut output = self.run(style, &requests, placeholders, connector.clone());
                    output.reloads = reloads;
                    let missing = connector.missing_items();
                    if missing.is_empty() {
                        PassState::Complete(output)
                    } else {
                        PassState::AwaitingReload {
                            output,
                            missing: dedup_first_seen(missing),
                        }
                    }
                }
                PassState::AwaitingReload {
                    mut output,
                    missing,
                } => {
                    let restart = match reload {
                        Some(client) => self.reload(client, store, &missing).await,
                        None => false,
                    };
                    if restart {
                        reloads += 1;
                        PassState::Init
                    } else {
                        output.unresolved = missing;
                        PassState::Complete(output)
                    }
                }
                PassState::Complete(output) => return output,
            }
        }
    }

    /// Reload the store if the throttle allows it. Returns whether the pass
    /// should start over.
    async fn reload(
        &self,
        client: &BibSyncClient,
        store: &StoreHandle,
        missing: &[String],
    ) -> bool {
        if !store.history().reload_allowed(Utc::now(), self.reload_window) {
            tracing::debug!(
                missing = missing.len(),
                "Reload throttled, keeping unresolved citations"
            );
            return false;
        }

        tracing::info!(
            missing = missing.len(),
            "Reloading bibliography for missing citations"
        );
        if let Err(e) = client.sync().await {
            tracing::warn!("Bibliography reload failed: {}", e);
            return false;
        }

        let connector = StyleSourceConnector::new(store.clone());
        let found = connector.any_present(missing);
        if !found {
            tracing::debug!("Reload did not provide any missing entry");
        }
        found
    }

    fn run(
        &self,
        style: &StyleDefinition,
        requests: &[CitationRequest],
        placeholders: &[CitationPlaceholder],
        connector: Arc<StyleSourceConnector>,
    ) -> FormattedOutput {
        let source: Arc<dyn ItemSource> = connector;
        let mut engine = self.factory.build(style, source);
        let class = engine.style_class();

        let is_textcite = |i: usize| {
            class == StyleClass::InText
                && placeholders
                    .get(i)
                    .is_some_and(|p| p.mode == CitationMode::Textcite)
        };

        let mut citations: Vec<FormattedCitation> = Vec::with_capacity(requests.len());
        for (i, request) in requests.iter().enumerate().take(placeholders.len()) {
            let updates = engine.append_citation_cluster(request);
            let mut text = None;
            for update in &updates {
                if update.index == i {
                    text = Some(update.text.clone());
                } else if update.index < citations.len() {
                    // Split citations are rebuilt from the engine's current state.
                    citations[update.index].display_text = if is_textcite(update.index) {
                        textcite(engine.as_mut(), &requests[update.index])
                    } else {
                        update.text.clone()
                    };
                }
            }
            let mut display_text = text
                .or_else(|| updates.first().map(|u| u.text.clone()))
                .unwrap_or_default();

            if is_textcite(i) {
                display_text = textcite(engine.as_mut(), request);
            }

            citations.push(FormattedCitation {
                display_text,
                note_index: request.note_index,
            });
        }

        FormattedOutput {
            citations,
            citation_class: Some(class),
            bibliography: engine.make_bibliography(),
            unresolved: Vec::new(),
            reloads: 0,
        }
    }
}

/// Author in running text followed by the parenthesized date, per item
fn textcite(engine: &mut dyn CitationEngine, request: &CitationRequest) -> String {
    request
        .items
        .iter()
        .map(|item| {
            let author = engine.make_citation_cluster(&[item.author_only()]);
            let date = engine.make_citation_cluster(&[item.suppress_author()]);
            format!("{author} {date}")
        })
        .collect::<Vec<_>>()
        .join("; ")
}

impl std::fmt::Debug for CitationFormatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CitationFormatter")
            .field("styles", &self.registry.len())
            .field("reload_window", &self.reload_window)
            .field("default_style", &self.default_style)
            .finish()
    }
}
