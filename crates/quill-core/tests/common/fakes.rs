//! Test doubles for the bibliography service, notifier and style processor

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use quill_core::citations::{
    Bibliography, BibliographyStyle, CitationEngine, CitationItemRequest, CitationRequest,
    ClusterUpdate, CslItem, EngineFactory, ItemSource, StyleClass, StyleDefinition,
    StyleRegistry,
};
use quill_core::quill_domain::{BibCategory, CategoryId, CategoryUpdate, EntryId};
use quill_core::sync::{
    BibliographyService, CategorySaveReply, ListRequest, ListResponse, SaveRequest, SaveResponse,
    ServerBibItem,
};
use quill_core::{AlertLevel, Notifier, SyncError};

// === Fixtures ===

pub fn server_item(id: EntryId, key: &str, family: &str, year: i32) -> ServerBibItem {
    ServerBibItem {
        id,
        fields: format!(
            r#"{{"title":"Work of {family}","author":[{{"family":"{family}","given":"A."}}],"date":"{year}"}}"#
        ),
        bib_type: "article".to_string(),
        entry_key: key.to_string(),
        entry_cat: "[]".to_string(),
    }
}

pub fn full_list(items: Vec<ServerBibItem>, categories: Vec<BibCategory>) -> ListResponse {
    let count = items.len() as i64;
    ListResponse {
        bib_categories: categories,
        bib_list: Some(items),
        last_modified: 1_700_000_000,
        number_of_entries: count,
        owner_id: None,
    }
}

pub fn cache_current(categories: Vec<BibCategory>) -> ListResponse {
    ListResponse {
        bib_categories: categories,
        bib_list: None,
        last_modified: 1_700_000_000,
        number_of_entries: 0,
        owner_id: None,
    }
}

pub fn server_error(status: u16, message: &str) -> SyncError {
    SyncError::Server {
        status,
        message: message.to_string(),
    }
}

// === Bibliography service ===

/// Scripted service: each call pops the next queued reply and is recorded
#[derive(Default)]
pub struct MockService {
    pub lists: Mutex<VecDeque<Result<ListResponse, SyncError>>>,
    pub saves: Mutex<VecDeque<Result<SaveResponse, SyncError>>>,
    pub category_saves: Mutex<VecDeque<Result<CategorySaveReply, SyncError>>>,
    pub deletes: Mutex<VecDeque<Result<(), SyncError>>>,

    pub list_requests: Mutex<Vec<ListRequest>>,
    pub save_requests: Mutex<Vec<SaveRequest>>,
    pub category_updates: Mutex<Vec<CategoryUpdate>>,
    pub deleted_categories: Mutex<Vec<Vec<CategoryId>>>,
    pub deleted_entries: Mutex<Vec<Vec<EntryId>>>,
}

impl MockService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_list(&self, reply: Result<ListResponse, SyncError>) {
        self.lists.lock().unwrap().push_back(reply);
    }

    pub fn push_save(&self, reply: Result<SaveResponse, SyncError>) {
        self.saves.lock().unwrap().push_back(reply);
    }

    pub fn push_category_save(&self, reply: Result<CategorySaveReply, SyncError>) {
        self.category_saves.lock().unwrap().push_back(reply);
    }

    pub fn push_delete(&self, reply: Result<(), SyncError>) {
        self.deletes.lock().unwrap().push_back(reply);
    }

    pub fn list_calls(&self) -> usize {
        self.list_requests.lock().unwrap().len()
    }

    pub fn last_list_request(&self) -> Option<ListRequest> {
        self.list_requests.lock().unwrap().last().copied()
    }
}

#[async_trait]
impl BibliographyService for MockService {
    async fn list(&self, request: &ListRequest) -> Result<ListResponse, SyncError> {
        self.list_requests.lock().unwrap().push(*request);
        self.lists
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(full_list(Vec::new(), Vec::new())))
    }

    async fn save_entries(&self, request: &SaveRequest) -> Result<SaveResponse, SyncError> {
        self.save_requests.lock().unwrap().push(request.clone());
        self.saves
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(SaveResponse::default()))
    }

    async fn save_categories(
        &self,
        update: &CategoryUpdate,
    ) -> Result<CategorySaveReply, SyncError> {
        self.category_updates.lock().unwrap().push(update.clone());
        self.category_saves
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(CategorySaveReply::default()))
    }

    async fn delete_categories(&self, ids: &[CategoryId]) -> Result<(), SyncError> {
        self.deleted_categories.lock().unwrap().push(ids.to_vec());
        self.deletes.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }

    async fn delete_entries(&self, ids: &[EntryId]) -> Result<(), SyncError> {
        self.deleted_entries.lock().unwrap().push(ids.to_vec());
        self.deletes.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}

// === Notifier ===

#[derive(Default)]
pub struct RecordingNotifier {
    pub alerts: Mutex<Vec<(AlertLevel, String)>>,
    pub waits_started: AtomicUsize,
    pub waits_finished: AtomicUsize,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn alerts(&self) -> Vec<(AlertLevel, String)> {
        self.alerts.lock().unwrap().clone()
    }

    pub fn waits(&self) -> (usize, usize) {
        (
            self.waits_started.load(Ordering::SeqCst),
            self.waits_finished.load(Ordering::SeqCst),
        )
    }
}

impl Notifier for RecordingNotifier {
    fn alert(&self, level: AlertLevel, message: &str) {
        self.alerts.lock().unwrap().push((level, message.to_string()));
    }

    fn wait_started(&self) {
        self.waits_started.fetch_add(1, Ordering::SeqCst);
    }

    fn wait_finished(&self) {
        self.waits_finished.fetch_add(1, Ordering::SeqCst);
    }
}

// === Style processor ===

const IN_TEXT: &str = r#"<style class="in-text"/>"#;
const NOTE: &str = r#"<style class="note"/>"#;

/// Registry of two in-text styles and one note style
pub fn styles() -> StyleRegistry {
    StyleRegistry::new()
        .with_style(StyleDefinition::new("author-date", "Author-Date", IN_TEXT))
        .with_style(StyleDefinition::new("numeric", "Numeric", IN_TEXT))
        .with_style(StyleDefinition::new("footnotes", "Footnotes", NOTE))
}

/// Builds `ScriptedEngine`s and records every cluster they receive
#[derive(Default)]
pub struct ScriptedFactory {
    pub builds: Mutex<Vec<String>>,
    pub clusters: Arc<Mutex<Vec<CitationRequest>>>,
    pub bibliography_style: BibliographyStyle,
    /// Every append also revises the previous cluster, as year suffixes do
    pub revise_previous: bool,
}

impl ScriptedFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_bibliography_style(style: BibliographyStyle) -> Arc<Self> {
        Arc::new(Self {
            bibliography_style: style,
            ..Self::default()
        })
    }

    pub fn revising() -> Arc<Self> {
        Arc::new(Self {
            revise_previous: true,
            ..Self::default()
        })
    }

    pub fn built_styles(&self) -> Vec<String> {
        self.builds.lock().unwrap().clone()
    }
}

impl EngineFactory for ScriptedFactory {
    fn build(
        &self,
        style: &StyleDefinition,
        source: Arc<dyn ItemSource>,
    ) -> Box<dyn CitationEngine> {
        self.builds.lock().unwrap().push(style.id.clone());
        let class = if style.definition.contains("\"note\"") {
            StyleClass::Note
        } else {
            StyleClass::InText
        };
        Box::new(ScriptedEngine {
            class,
            numeric: style.id == "numeric",
            source,
            cited: Vec::new(),
            numbers: HashMap::new(),
            rendered: Vec::new(),
            revise_previous: self.revise_previous,
            clusters: self.clusters.clone(),
            bibliography_style: self.bibliography_style.clone(),
        })
    }
}

/// Renders `(Family Year, p. X)` for in-text, `n. Family Year` for notes and
/// `[n]` for the numeric style; unknown ids render as `[id?]`.
pub struct ScriptedEngine {
    class: StyleClass,
    numeric: bool,
    source: Arc<dyn ItemSource>,
    cited: Vec<(String, CslItem)>,
    numbers: HashMap<String, usize>,
    rendered: Vec<String>,
    revise_previous: bool,
    clusters: Arc<Mutex<Vec<CitationRequest>>>,
    bibliography_style: BibliographyStyle,
}

impl ScriptedEngine {
    fn author(item: &CslItem) -> String {
        item.get("author")
            .and_then(|a| a[0]["family"].as_str())
            .unwrap_or("Anon")
            .to_string()
    }

    fn year(item: &CslItem) -> String {
        item.get("issued")
            .and_then(|d| d["date-parts"][0][0].as_i64())
            .map(|y| y.to_string())
            .unwrap_or_else(|| "n.d.".to_string())
    }

    fn resolve(&mut self, id: &str) -> Option<CslItem> {
        let item = self.source.retrieve_item(id)?;
        if !self.numbers.contains_key(id) {
            let next = self.numbers.len() + 1;
            self.numbers.insert(id.to_string(), next);
            self.cited.push((id.to_string(), item.clone()));
        }
        Some(item)
    }

    fn render_item(&mut self, request: &CitationItemRequest) -> String {
        let Some(item) = self.resolve(&request.id) else {
            return format!("[{}?]", request.id);
        };
        let mut text = String::new();
        if let Some(prefix) = &request.prefix {
            text.push_str(prefix);
            text.push(' ');
        }
        if self.numeric {
            text.push_str(&self.numbers[&request.id].to_string());
        } else if request.author_only {
            return Self::author(&item);
        } else if request.suppress_author {
            text.push_str(&Self::year(&item));
        } else {
            text.push_str(&format!("{} {}", Self::author(&item), Self::year(&item)));
        }
        if let Some(locator) = &request.locator {
            text.push_str(&format!(", p. {locator}"));
        }
        text
    }

    fn render(&mut self, items: &[CitationItemRequest]) -> String {
        let parts: Vec<String> = items.iter().map(|i| self.render_item(i)).collect();
        if items.len() == 1 && items[0].author_only {
            return parts.join("");
        }
        if self.numeric {
            format!("[{}]", parts.join(", "))
        } else {
            format!("({})", parts.join("; "))
        }
    }
}

impl CitationEngine for ScriptedEngine {
    fn style_class(&self) -> StyleClass {
        self.class
    }

    fn append_citation_cluster(&mut self, citation: &CitationRequest) -> Vec<ClusterUpdate> {
        self.clusters.lock().unwrap().push(citation.clone());
        let index = self.rendered.len();
        let text = match self.class {
            StyleClass::InText => self.render(&citation.items),
            StyleClass::Note => {
                let body: Vec<String> = citation
                    .items
                    .iter()
                    .map(|i| self.render_item(i))
                    .collect();
                format!("{}. {}", citation.note_index, body.join("; "))
            }
        };
        self.rendered.push(text.clone());
        let mut updates = vec![ClusterUpdate { index, text }];
        if self.revise_previous && index > 0 {
            let revised = self.rendered[index - 1].replacen(')', "a)", 1);
            updates.insert(
                0,
                ClusterUpdate {
                    index: index - 1,
                    text: revised,
                },
            );
        }
        updates
    }

    fn make_citation_cluster(&mut self, items: &[CitationItemRequest]) -> String {
        self.render(items)
    }

    fn make_bibliography(&mut self) -> Bibliography {
        let entries = self
            .cited
            .iter()
            .map(|(id, item)| {
                (
                    id.clone(),
                    format!(
                        "<div class=\"csl-entry\">{} {}</div>",
                        Self::author(item),
                        Self::year(item)
                    ),
                )
            })
            .collect();
        Bibliography::new(entries, self.bibliography_style.clone())
    }
}
