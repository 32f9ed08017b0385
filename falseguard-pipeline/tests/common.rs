#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;
use falseguard_common::observability::{LogConfig, LogFormat};
use falseguard_llm::service::{GenerationError, ModelService, PromptCall};
use falseguard_search::{EvidenceSearchTool, SearchOutcome, SearchResult, SearchResultKind};
use serde_json::Value;
use tokio::sync::Notify;

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "falseguard-tests".to_string(),
            emit_stderr: true,
            format: LogFormat::from_env_or(LogFormat::Text),
            default_filter: "debug".to_string(),
            ..LogConfig::default()
        };
        falseguard_common::observability::init_logging(config).unwrap_or_default()
    });
}

/// Replies per call name; records every call it sees.
#[derive(Default)]
pub struct ScriptedModel {
    replies: HashMap<&'static str, Result<Value, String>>,
    gates: HashMap<&'static str, Arc<Notify>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, call: &'static str, value: Value) -> Self {
        self.replies.insert(call, Ok(value));
        self
    }

    pub fn fail(mut self, call: &'static str, message: &str) -> Self {
        self.replies.insert(call, Err(message.to_string()));
        self
    }

    /// Hold `call` until `gate` is notified.
    pub fn gate(mut self, call: &'static str, gate: Arc<Notify>) -> Self {
        self.gates.insert(call, gate);
        self
    }

    pub fn call_names(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn prompt_of(&self, call: &str) -> Option<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .find(|(name, _)| name == call)
            .map(|(_, prompt)| prompt.clone())
    }

    pub fn count(&self, call: &str) -> usize {
        self.call_names().iter().filter(|n| *n == call).count()
    }
}

#[async_trait]
impl ModelService for ScriptedModel {
    async fn invoke(&self, call: &PromptCall) -> Result<Value, GenerationError> {
        self.calls
            .lock()
            .unwrap()
            .push((call.name.to_string(), call.prompt.clone()));

        if let Some(gate) = self.gates.get(call.name) {
            gate.notified().await;
        }

        match self.replies.get(call.name) {
            Some(Ok(v)) => Ok(v.clone()),
            Some(Err(msg)) => Err(GenerationError::Provider {
                call: call.name,
                message: msg.clone(),
            }),
            None => Err(GenerationError::Malformed {
                call: call.name,
                reason: "no scripted reply".to_string(),
            }),
        }
    }
}

/// Returns a fixed outcome and records the queries it was given.
pub struct FakeSearch {
    outcome: SearchOutcome,
    queries: Mutex<Vec<String>>,
    on_search: Option<Arc<Notify>>,
}

impl FakeSearch {
    pub fn new(outcome: SearchOutcome) -> Self {
        Self {
            outcome,
            queries: Mutex::new(Vec::new()),
            on_search: None,
        }
    }

    pub fn with_results(hits: &[(&str, &str)]) -> Self {
        Self::new(SearchOutcome::Results(
            hits.iter()
                .map(|(title, url)| SearchResult {
                    title: title.to_string(),
                    url: url.to_string(),
                    kind: SearchResultKind::Article,
                })
                .collect(),
        ))
    }

    pub fn notify_on_search(mut self, gate: Arc<Notify>) -> Self {
        self.on_search = Some(gate);
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl EvidenceSearchTool for FakeSearch {
    async fn search(&self, query: &str) -> SearchOutcome {
        self.queries.lock().unwrap().push(query.to_string());
        if let Some(gate) = &self.on_search {
            gate.notify_one();
        }
        self.outcome.clone()
    }

    fn provider(&self) -> &'static str {
        "Fake"
    }
}
