//! Tavily search API (`POST /search`).

use crate::types::{verified_hit_url, SearchError, SearchOutcome, SearchResult, SearchResultKind};
use crate::EvidenceSearchTool;
use async_trait::async_trait;
use falseguard_config::{MAX_SEARCH_RESULTS, TAVILY_API_KEY_ENV};
use falseguard_http::HttpClient;
use serde::{Deserialize, Serialize};

const PROVIDER: &str = "Tavily";

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    max_results: usize,
    search_depth: &'static str,
    include_images: bool,
    include_answer: bool,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyHit>,
}

#[derive(Debug, Deserialize)]
struct TavilyHit {
    #[serde(default)]
    title: String,
    url: String,
}

pub struct TavilySearchTool {
    http: HttpClient,
    api_key: Option<String>,
    max_results: usize,
}

impl TavilySearchTool {
    /// `api_key` of `None` (or blank) is accepted; every search then reports
    /// the missing credential instead of calling out.
    pub fn new(
        endpoint: &str,
        api_key: Option<String>,
        max_results: usize,
    ) -> Result<Self, SearchError> {
        let http = HttpClient::new(endpoint).map_err(|source| SearchError::Endpoint {
            provider: PROVIDER,
            source,
        })?;
        Ok(Self {
            http: http.with_retries(1),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            max_results: max_results.clamp(1, MAX_SEARCH_RESULTS),
        })
    }

    async fn run(&self, query: &str) -> Result<Vec<SearchResult>, SearchError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(SearchError::MissingCredential {
                provider: PROVIDER,
                env: TAVILY_API_KEY_ENV,
            })?;

        let body = TavilyRequest {
            query,
            max_results: self.max_results,
            search_depth: "basic",
            include_images: false,
            include_answer: false,
        };

        let resp: TavilyResponse = self
            .http
            .post_json("search", Some(api_key), &body)
            .await
            .map_err(|source| SearchError::Request {
                provider: PROVIDER,
                source,
            })?;

        // Tavily does not report a content type; every hit is filed as an article.
        let results = resp
            .results
            .into_iter()
            .filter_map(|hit| {
                let url = verified_hit_url(&hit.url)?;
                Some(SearchResult {
                    title: hit.title.trim().to_string(),
                    url,
                    kind: SearchResultKind::Article,
                })
            })
            .take(self.max_results)
            .collect();
        Ok(results)
    }
}

#[async_trait]
impl EvidenceSearchTool for TavilySearchTool {
    async fn search(&self, query: &str) -> SearchOutcome {
        match self.run(query).await {
            Ok(results) => {
                tracing::info!(
                    target: "search.tavily",
                    query = %query,
                    hit_count = results.len(),
                    "tavily.search"
                );
                SearchOutcome::Results(results)
            }
            Err(e) => {
                tracing::warn!(target: "search.tavily", error = %e, "tavily.search failed");
                e.into()
            }
        }
    }

    fn provider(&self) -> &'static str {
        PROVIDER
    }
}
