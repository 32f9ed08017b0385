use crate::media::MediaPayload;
use async_trait::async_trait;
use falseguard_common::{FalseguardError, Result};
use falseguard_http::HttpError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub model: Option<String>,
    pub tokens_used: Option<u32>,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a response to the given prompt with optional system prompt
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse>;

    /// Generate with an attached document or image.
    async fn generate_with_media(
        &self,
        _prompt: &str,
        _system_prompt: Option<&str>,
        media: &MediaPayload,
        _max_tokens: Option<u32>,
        _temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        Err(FalseguardError::Unsupported(format!(
            "model {} does not accept {} input",
            self.model_name(),
            media.mime_type()
        )))
    }

    /// Get the model name being used
    fn model_name(&self) -> &str;
}

/// Map transport failures onto the shared error type with provider context.
pub(crate) fn http_to_falseguard(provider: &str, e: HttpError) -> FalseguardError {
    match e.status().map(|s| s.as_u16()) {
        Some(429) => FalseguardError::Provider(format!("{provider}: rate limit exceeded")),
        Some(401) | Some(403) => {
            FalseguardError::Provider(format!("{provider}: invalid API key or access forbidden"))
        }
        _ => match e {
            HttpError::Timeout(_) => FalseguardError::Timeout,
            other => FalseguardError::Provider(format!("{provider}: {other}")),
        },
    }
}
