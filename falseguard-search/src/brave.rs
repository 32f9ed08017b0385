//! Brave Search API, web vertical (`GET res/v1/web/search`).

use crate::types::{verified_hit_url, SearchError, SearchOutcome, SearchResult, SearchResultKind};
use crate::EvidenceSearchTool;
use async_trait::async_trait;
use falseguard_config::{BRAVE_API_KEY_ENV, MAX_SEARCH_RESULTS};
use falseguard_http::{Auth, HttpClient, RequestOpts};
use serde::Deserialize;
use std::borrow::Cow;

const PROVIDER: &str = "Brave";

#[derive(Debug, Default, Deserialize)]
struct WebSearchApiResponse {
    #[serde(default)]
    web: Option<Vertical>,
    #[serde(default)]
    videos: Option<Vertical>,
}

#[derive(Debug, Default, Deserialize)]
struct Vertical {
    #[serde(default)]
    results: Vec<BraveHit>,
}

#[derive(Debug, Deserialize)]
struct BraveHit {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    subtype: Option<String>,
}

fn kind_from_subtype(subtype: Option<&str>) -> SearchResultKind {
    match subtype {
        None | Some("generic") | Some("article") | Some("news") => SearchResultKind::Article,
        Some("video") => SearchResultKind::Video,
        Some(_) => SearchResultKind::Other,
    }
}

/// Minimal client for Brave Search.
#[derive(Clone)]
pub struct BraveSearchTool {
    http: HttpClient,
    token: Option<String>,
    max_results: usize,
}

impl BraveSearchTool {
    pub fn new(
        endpoint: &str,
        subscription_token: Option<String>,
        max_results: usize,
    ) -> Result<Self, SearchError> {
        let http = HttpClient::new(endpoint).map_err(|source| SearchError::Endpoint {
            provider: PROVIDER,
            source,
        })?;
        Ok(Self {
            http: http.with_retries(1),
            token: subscription_token.filter(|k| !k.trim().is_empty()),
            max_results: max_results.clamp(1, MAX_SEARCH_RESULTS),
        })
    }

    async fn run(&self, query: &str) -> Result<Vec<SearchResult>, SearchError> {
        let token = self
            .token
            .as_deref()
            .ok_or(SearchError::MissingCredential {
                provider: PROVIDER,
                env: BRAVE_API_KEY_ENV,
            })?;
        let request_failed = |source| SearchError::Request {
            provider: PROVIDER,
            source,
        };

        let count = self.max_results.to_string();
        let opts = RequestOpts {
            auth: Some(Auth::header("x-subscription-token", token).map_err(request_failed)?),
            query: Some(vec![
                ("q", Cow::Borrowed(query)),
                ("count", Cow::Owned(count)),
                ("safesearch", Cow::Borrowed("moderate")),
            ]),
            ..Default::default()
        };

        let resp: WebSearchApiResponse = self
            .http
            .get_json("res/v1/web/search", opts)
            .await
            .map_err(request_failed)?;

        let web = resp.web.unwrap_or_default().results.into_iter().map(|hit| {
            let kind = kind_from_subtype(hit.subtype.as_deref());
            (hit, kind)
        });
        let videos = resp
            .videos
            .unwrap_or_default()
            .results
            .into_iter()
            .map(|hit| (hit, SearchResultKind::Video));

        let mut results: Vec<SearchResult> = Vec::new();
        for (hit, kind) in web.chain(videos) {
            let Some(url) = verified_hit_url(&hit.url) else {
                continue;
            };
            if results.iter().any(|r| r.url == url) {
                continue;
            }
            results.push(SearchResult {
                title: hit.title.trim().to_string(),
                url,
                kind,
            });
            if results.len() == self.max_results {
                break;
            }
        }
        Ok(results)
    }
}

#[async_trait]
impl EvidenceSearchTool for BraveSearchTool {
    async fn search(&self, query: &str) -> SearchOutcome {
        match self.run(query).await {
            Ok(results) => {
                tracing::info!(
                    target: "search.brave",
                    query = %query,
                    hit_count = results.len(),
                    "brave.search"
                );
                SearchOutcome::Results(results)
            }
            Err(e) => {
                tracing::warn!(target: "search.brave", error = %e, "brave.search failed");
                e.into()
            }
        }
    }

    fn provider(&self) -> &'static str {
        PROVIDER
    }
}
