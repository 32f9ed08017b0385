//! Provider-agnostic LLM integration for FalseGuard.
//!
//! This crate exposes a common [`traits::LlmClient`] interface with Gemini,
//! OpenAI and Ollama implementations, the [`service::ModelService`] used by
//! the analysis pipeline to obtain typed structured output, and the
//! [`schema`] contracts those outputs implement.
//!
//! # Examples
//! ```no_run
//! use falseguard_config::LlmConfig;
//! use falseguard_llm::ensure_llm_ready;
//!
//! # #[tokio::main]
//! # async fn main() -> falseguard_common::Result<()> {
//! let client = ensure_llm_ready(&LlmConfig::default()).await?;
//! assert!(!client.model_name().is_empty());
//! # Ok(())
//! # }
//! ```
pub mod gemini;
pub mod media;
pub mod ollama;
pub mod openai;
pub mod schema;
pub mod service;
pub mod traits;

use falseguard_common::{FalseguardError, Result};
use falseguard_config::{LlmConfig, GEMINI_API_KEY_ENV, OPENAI_API_KEY_ENV};
use gemini::GeminiClient;
use ollama::OllamaClient;
use openai::OpenAiClient;
use std::sync::Arc;
use traits::LlmClient;

/// Build the configured LLM client, probing local servers where that is cheap.
pub async fn ensure_llm_ready(config: &LlmConfig) -> Result<Arc<dyn LlmClient + Send + Sync>> {
    match config {
        LlmConfig::Gemini {
            model,
            api_key,
            endpoint,
            ..
        } => {
            let key = require_key(api_key.as_deref(), "Gemini", GEMINI_API_KEY_ENV)?;
            let client = GeminiClient::new(endpoint, key, model.clone())?;
            Ok(Arc::new(client))
        }
        LlmConfig::Openai {
            model,
            api_key,
            endpoint,
            ..
        } => {
            let key = require_key(api_key.as_deref(), "OpenAI", OPENAI_API_KEY_ENV)?;
            let client = OpenAiClient::new(endpoint, key, model.clone())?;
            Ok(Arc::new(client))
        }
        LlmConfig::Ollama {
            model, endpoint, ..
        } => {
            let client = OllamaClient::new(endpoint, model.clone()).await?;
            Ok(Arc::new(client))
        }
    }
}

fn require_key(key: Option<&str>, provider: &str, env: &str) -> Result<String> {
    match key.map(str::trim) {
        Some(k) if !k.is_empty() => Ok(k.to_string()),
        _ => Err(FalseguardError::Config(format!(
            "{provider} API key not configured. Set {env} or llm.api_key"
        ))),
    }
}
