//! Evidence search for FalseGuard.
//!
//! - [`EvidenceSearchTool`]: query in, bounded [`SearchOutcome`] out; never fails
//! - Tavily (`tavily`) and Brave (`brave`) providers over `falseguard-http`
//! - [`TimeoutSearchTool`] bounds any provider by a wall-clock budget
//!
//! Credentials are passed in explicitly. A tool built without one still
//! constructs; its searches return an error outcome naming the missing key.

pub mod brave;
pub mod tavily;
pub mod types;

use async_trait::async_trait;
use falseguard_config::{SearchConfig, SearchProviderConfig};
use std::sync::Arc;
use std::time::Duration;

pub use brave::BraveSearchTool;
pub use tavily::TavilySearchTool;
pub use types::{SearchError, SearchOutcome, SearchResult, SearchResultKind};

#[async_trait]
pub trait EvidenceSearchTool: Send + Sync {
    /// Run one web search. Provider failures come back as
    /// [`SearchOutcome::Error`], never as a panic or `Err`.
    async fn search(&self, query: &str) -> SearchOutcome;

    fn provider(&self) -> &'static str;
}

/// Wraps a tool so that a slow provider yields an error outcome.
pub struct TimeoutSearchTool<T> {
    inner: T,
    budget: Duration,
}

impl<T: EvidenceSearchTool> TimeoutSearchTool<T> {
    pub fn new(inner: T, budget: Duration) -> Self {
        Self { inner, budget }
    }
}

#[async_trait]
impl<T: EvidenceSearchTool> EvidenceSearchTool for TimeoutSearchTool<T> {
    async fn search(&self, query: &str) -> SearchOutcome {
        match tokio::time::timeout(self.budget, self.inner.search(query)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!(
                    target: "search",
                    provider = self.inner.provider(),
                    budget_ms = self.budget.as_millis() as u64,
                    "search timed out"
                );
                SearchError::Timeout(self.budget).into()
            }
        }
    }

    fn provider(&self) -> &'static str {
        self.inner.provider()
    }
}

/// Build the configured provider, bounded by `search.timeout_secs`.
pub fn from_config(config: &SearchConfig) -> Result<Arc<dyn EvidenceSearchTool>, SearchError> {
    let budget = Duration::from_secs(config.timeout_secs);
    let tool: Arc<dyn EvidenceSearchTool> = match &config.provider {
        SearchProviderConfig::Tavily { api_key, endpoint } => Arc::new(TimeoutSearchTool::new(
            TavilySearchTool::new(endpoint, api_key.clone(), config.max_results)?,
            budget,
        )),
        SearchProviderConfig::Brave { api_key, endpoint } => Arc::new(TimeoutSearchTool::new(
            BraveSearchTool::new(endpoint, api_key.clone(), config.max_results)?,
            budget,
        )),
    };
    tracing::debug!(target: "search", provider = tool.provider(), "search tool ready");
    Ok(tool)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stalled;

    #[async_trait]
    impl EvidenceSearchTool for Stalled {
        async fn search(&self, _query: &str) -> SearchOutcome {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            SearchOutcome::Results(vec![])
        }

        fn provider(&self) -> &'static str {
            "stalled"
        }
    }

    #[tokio::test]
    async fn expiry_becomes_error_outcome() {
        let tool = TimeoutSearchTool::new(Stalled, Duration::from_millis(50));
        let outcome = tool.search("anything").await;
        assert_eq!(
            outcome,
            SearchOutcome::Error("search timed out after 50ms".into())
        );
    }

    #[tokio::test]
    async fn missing_key_from_config_is_an_error_outcome_not_a_build_failure() {
        let config = SearchConfig {
            provider: SearchProviderConfig::Tavily {
                api_key: None,
                endpoint: "https://api.tavily.com".into(),
            },
            ..SearchConfig::default()
        };
        let tool = from_config(&config).unwrap();
        assert_eq!(tool.provider(), "Tavily");
        match tool.search("chocolate cures cancer").await {
            SearchOutcome::Error(msg) => assert!(msg.contains("TAVILY_API_KEY")),
            other => panic!("expected error outcome, got {other:?}"),
        }
    }

    #[test]
    fn bad_endpoint_fails_at_build_time() {
        let config = SearchConfig {
            provider: SearchProviderConfig::Brave {
                api_key: Some("k".into()),
                endpoint: "not a url".into(),
            },
            ..SearchConfig::default()
        };
        assert!(matches!(
            from_config(&config),
            Err(SearchError::Endpoint { provider: "Brave", .. })
        ));
    }
}
