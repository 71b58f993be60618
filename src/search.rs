use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::constants;

/// What a search produced. Either way it is forwarded to the model untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchResult {
    Results(serde_json::Value),
    Error(String),
}

impl SearchResult {
    fn failed(detail: impl std::fmt::Display) -> Self {
        SearchResult::Error(format!("An error occurred during web search: {}", detail))
    }
}

/// A web-search backend. Implementations never fail: problems come back as
/// `SearchResult::Error`.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> SearchResult;
}

#[derive(Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
}

/// Client for the Serper Google search API.
pub struct SerperClient {
    client: Client,
    api_key: String,
    url: String,
}

impl SerperClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_url(api_key, constants::SERPER_URL.clone())
    }

    pub fn with_url(api_key: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl SearchProvider for SerperClient {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn search(&self, query: &str) -> SearchResult {
        let response = match self
            .client
            .post(&self.url)
            .header("X-API-KEY", &self.api_key)
            .json(&SerperRequest { q: query })
            .send()
            .await
            .and_then(|r| r.error_for_status())
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Web search request failed");
                return SearchResult::failed(e);
            }
        };

        match response.json::<serde_json::Value>().await {
            Ok(results) => {
                debug!("Web search returned results");
                SearchResult::Results(results)
            }
            Err(e) => {
                warn!(error = %e, "Web search response was not JSON");
                SearchResult::failed(e)
            }
        }
    }
}
