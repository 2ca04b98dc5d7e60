//! `BibliographyService` over the web application's form endpoints

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use quill_domain::{CategoryId, CategoryUpdate, EntryId};

use super::{HttpClient, HttpResponse};
use crate::config::ServerConfig;
use crate::error::SyncError;
use crate::sync::{
    BibliographyService, CategorySaveReply, ListRequest, ListResponse, SaveRequest, SaveResponse,
};

const LIST_PATH: &str = "bibliography/biblist/";
const SAVE_PATH: &str = "bibliography/save/";
const SAVE_CATEGORY_PATH: &str = "bibliography/save_category/";
const DELETE_CATEGORY_PATH: &str = "bibliography/delete_category/";
const DELETE_PATH: &str = "bibliography/delete/";

type Form = Vec<(String, String)>;

/// Talks to the bibliography endpoints of the web application
pub struct HttpBibliographyService {
    client: HttpClient,
}

impl HttpBibliographyService {
    pub fn new(config: &ServerConfig) -> Result<Self, SyncError> {
        Ok(Self {
            client: HttpClient::new(config)?,
        })
    }

    async fn post(&self, path: &str, form: Form) -> Result<HttpResponse, SyncError> {
        tracing::debug!(path, fields = form.len(), "POST");
        let response = self.client.post_form(path, &form).await?;
        if !response.is_success() {
            return Err(SyncError::Server {
                status: response.status,
                message: response.body,
            });
        }
        Ok(response)
    }
}

fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, SyncError> {
    serde_json::from_str(&response.body).map_err(|e| SyncError::Decode(e.to_string()))
}

fn id_list(ids: &[i64]) -> Form {
    ids.iter()
        .map(|id| ("ids[]".to_string(), id.to_string()))
        .collect()
}

fn list_form(request: &ListRequest) -> Form {
    vec![
        ("owner_id".to_string(), request.owner_id.to_string()),
        ("last_modified".to_string(), request.last_modified.to_string()),
        (
            "number_of_entries".to_string(),
            request.number_of_entries.to_string(),
        ),
    ]
}

fn save_form(request: &SaveRequest) -> Form {
    let mut form = vec![
        ("is_new".to_string(), request.is_new.to_string()),
        ("bibs".to_string(), request.bibs.clone()),
    ];
    if let Some(owner_id) = request.owner_id {
        form.push(("owner_id".to_string(), owner_id.to_string()));
    }
    form
}

fn category_form(update: &CategoryUpdate) -> Form {
    let mut form: Form = update
        .pairs()
        .map(|(id, _)| ("ids[]".to_string(), id.to_string()))
        .collect();
    form.extend(
        update
            .pairs()
            .map(|(_, title)| ("titles[]".to_string(), title.to_string())),
    );
    form
}

#[async_trait]
impl BibliographyService for HttpBibliographyService {
    async fn list(&self, request: &ListRequest) -> Result<ListResponse, SyncError> {
        let response = self.post(LIST_PATH, list_form(request)).await?;
        decode(&response)
    }

    async fn save_entries(&self, request: &SaveRequest) -> Result<SaveResponse, SyncError> {
        let response = self.post(SAVE_PATH, save_form(request)).await?;
        decode(&response)
    }

    async fn save_categories(
        &self,
        update: &CategoryUpdate,
    ) -> Result<CategorySaveReply, SyncError> {
        let response = self.post(SAVE_CATEGORY_PATH, category_form(update)).await?;
        let created = response.status == 201;
        let mut reply: CategorySaveReply = if created {
            decode(&response)?
        } else {
            CategorySaveReply::default()
        };
        reply.created = created;
        Ok(reply)
    }

    async fn delete_categories(&self, ids: &[CategoryId]) -> Result<(), SyncError> {
        self.post(DELETE_CATEGORY_PATH, id_list(ids)).await?;
        Ok(())
    }

    async fn delete_entries(&self, ids: &[EntryId]) -> Result<(), SyncError> {
        self.post(DELETE_PATH, id_list(ids)).await?;
        Ok(())
    }
}

impl std::fmt::Debug for HttpBibliographyService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBibliographyService").finish_non_exhaustive()
    }
}
