//! Native HTTP client using reqwest

use super::{HttpError, HttpResponse};
use reqwest::Client;
use std::time::Duration;

use crate::config::ServerConfig;

/// Form-posting HTTP client bound to one server
pub struct HttpClient {
    client: Client,
    base_url: url::Url,
    user_agent: String,
    csrf_token: Option<String>,
}

impl HttpClient {
    pub fn new(config: &ServerConfig) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| HttpError::RequestFailed {
                message: e.to_string(),
            })?;
        let base_url = url::Url::parse(&config.base_url).map_err(|_| HttpError::InvalidUrl {
            url: config.base_url.clone(),
        })?;

        Ok(Self {
            client,
            base_url,
            user_agent: config.user_agent.clone(),
            csrf_token: config.csrf_token.clone(),
        })
    }

    /// Resolve a path relative to the configured base URL
    pub fn endpoint(&self, path: &str) -> Result<url::Url, HttpError> {
        self.base_url.join(path).map_err(|_| HttpError::InvalidUrl {
            url: format!("{}{}", self.base_url, path),
        })
    }

    /// POST url-encoded form data. Repeated keys (`ids[]`) are sent once per value.
    pub async fn post_form(
        &self,
        path: &str,
        form: &[(String, String)],
    ) -> Result<HttpResponse, HttpError> {
        let url = self.endpoint(path)?;
        let mut request = self
            .client
            .post(url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json")
            .form(form);
        if let Some(token) = &self.csrf_token {
            request = request.header("X-CSRFToken", token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                HttpError::Timeout
            } else {
                HttpError::RequestFailed {
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| HttpError::ParseError {
            message: e.to_string(),
        })?;

        Ok(HttpResponse { status, body })
    }
}
