use falseguard_http::HttpError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Coarse media type of a search hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchResultKind {
    Article,
    Video,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    /// The link exactly as the provider returned it, minus surrounding whitespace.
    pub url: String,
    #[serde(rename = "type")]
    pub kind: SearchResultKind,
}

/// What a search tool hands back to its caller. Exactly one branch holds.
///
/// Serializes as `{"results": [...]}` or `{"error": "..."}` so it can be bound
/// directly into a prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchOutcome {
    Results(Vec<SearchResult>),
    Error(String),
}

impl SearchOutcome {
    pub fn results(&self) -> &[SearchResult] {
        match self {
            SearchOutcome::Results(results) => results,
            SearchOutcome::Error(_) => &[],
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SearchOutcome::Error(_))
    }
}

/// Provider-side failures. These never cross the tool boundary; each one is
/// rendered into [`SearchOutcome::Error`].
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("{provider} API key not found. Set {env} or search.api_key in the configuration.")]
    MissingCredential {
        provider: &'static str,
        env: &'static str,
    },
    #[error("invalid {provider} endpoint: {source}")]
    Endpoint {
        provider: &'static str,
        #[source]
        source: HttpError,
    },
    #[error(
        "Failed to search the web. Please check your {provider} API key and internet connection. Details: {source}"
    )]
    Request {
        provider: &'static str,
        #[source]
        source: HttpError,
    },
    #[error("search timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl From<SearchError> for SearchOutcome {
    fn from(e: SearchError) -> Self {
        SearchOutcome::Error(e.to_string())
    }
}

/// Keep a provider URL only if it is an absolute http(s) link.
///
/// The parsed form is used for the check alone; callers get the provider's
/// own spelling back.
pub(crate) fn verified_hit_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed).ok()?;
    matches!(url.scheme(), "http" | "https").then(|| trimmed.to_string())
}
