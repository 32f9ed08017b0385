//! Model Invocation Service: prompt + target shape in, trusted JSON out.
//!
//! Stages describe a call with a [`PromptCall`] built for their output type
//! and obtain that type via [`invoke_structured`], which deserializes the
//! returned value and runs its [`StructuredOutput::check`]. Anything that is
//! not a valid structure comes back as a [`GenerationError`].

use crate::media::MediaPayload;
use crate::schema::{prompt_schema, SchemaViolation, StructuredOutput};
use crate::traits::LlmClient;
use async_trait::async_trait;
use regex::Regex;
use schemars::JsonSchema;
use serde_json::Value;
use std::sync::{Arc, OnceLock};

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("{call}: model provider failed: {message}")]
    Provider { call: &'static str, message: String },

    #[error("{call}: model output is not valid JSON: {reason}")]
    Malformed { call: &'static str, reason: String },

    #[error("{call}: model output violates schema at {violation}")]
    Schema {
        call: &'static str,
        violation: SchemaViolation,
    },
}

impl GenerationError {
    pub fn call(&self) -> &'static str {
        match self {
            GenerationError::Provider { call, .. }
            | GenerationError::Malformed { call, .. }
            | GenerationError::Schema { call, .. } => call,
        }
    }
}

/// One structured generation request.
#[derive(Debug, Clone)]
pub struct PromptCall {
    /// Stable name used in logs and errors (e.g. `classify_news`).
    pub name: &'static str,
    pub system: Option<String>,
    pub prompt: String,
    /// JSON Schema of the expected reply.
    pub schema: Value,
    pub media: Option<MediaPayload>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl PromptCall {
    /// A call whose reply must deserialize into `T`.
    pub fn new<T: JsonSchema>(name: &'static str, prompt: impl Into<String>) -> Self {
        Self {
            name,
            system: None,
            prompt: prompt.into(),
            schema: prompt_schema::<T>(),
            media: None,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_media(mut self, media: MediaPayload) -> Self {
        self.media = Some(media);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

#[async_trait]
pub trait ModelService: Send + Sync {
    /// Run the call and return the model's JSON object.
    async fn invoke(&self, call: &PromptCall) -> Result<Value, GenerationError>;
}

/// Invoke, deserialize into `T`, then run its semantic checks.
pub async fn invoke_structured<T>(
    service: &dyn ModelService,
    call: &PromptCall,
) -> Result<T, GenerationError>
where
    T: StructuredOutput,
{
    let value = service.invoke(call).await?;
    let schema_error = |violation| GenerationError::Schema {
        call: call.name,
        violation,
    };
    let out: T = serde_json::from_value(value)
        .map_err(|e| schema_error(SchemaViolation::new("$", e.to_string())))?;
    out.check().map_err(schema_error)?;
    Ok(out)
}

/// [`ModelService`] backed by any [`LlmClient`].
pub struct LlmModelService {
    client: Arc<dyn LlmClient + Send + Sync>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl LlmModelService {
    pub fn new(client: Arc<dyn LlmClient + Send + Sync>) -> Self {
        Self {
            client,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Defaults applied when a call does not set its own.
    pub fn with_defaults(mut self, temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }
}

#[async_trait]
impl ModelService for LlmModelService {
    async fn invoke(&self, call: &PromptCall) -> Result<Value, GenerationError> {
        let prompt = render_with_schema(&call.prompt, &call.schema);
        let temperature = call.temperature.or(self.temperature);
        let max_tokens = call.max_tokens.or(self.max_tokens);

        tracing::debug!(
            target: "llm.service",
            call = call.name,
            model = self.client.model_name(),
            has_media = call.media.is_some(),
            prompt_len = prompt.len(),
            "llm.invoke.start"
        );

        let response = match &call.media {
            Some(media) => {
                self.client
                    .generate_with_media(
                        &prompt,
                        call.system.as_deref(),
                        media,
                        max_tokens,
                        temperature,
                    )
                    .await
            }
            None => {
                self.client
                    .generate(&prompt, call.system.as_deref(), max_tokens, temperature)
                    .await
            }
        }
        .map_err(|e| GenerationError::Provider {
            call: call.name,
            message: e.to_string(),
        })?;

        let text = response.text.trim();
        let json_str = extract_json_block(text).unwrap_or(text);
        let value: Value =
            serde_json::from_str(json_str).map_err(|e| {
                tracing::warn!(
                    target: "llm.service",
                    call = call.name,
                    error = %e,
                    "llm.invoke.malformed"
                );
                GenerationError::Malformed {
                    call: call.name,
                    reason: e.to_string(),
                }
            })?;

        tracing::debug!(
            target: "llm.service",
            call = call.name,
            tokens_used = ?response.tokens_used,
            "llm.invoke.done"
        );
        Ok(value)
    }
}

fn render_with_schema(prompt: &str, schema: &Value) -> String {
    let schema_json = serde_json::to_string_pretty(schema).unwrap_or_else(|_| "{}".to_string());
    format!(
        "{prompt}\n\nRespond ONLY with a single JSON object that matches this JSON schema:\n{schema_json}\nThe JSON must be valid. Do not include any additional commentary or code fences."
    )
}

/// Locate a JSON object in model text; tolerates ```json fences and prose around it.
fn extract_json_block(text: &str) -> Option<&str> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    static BARE: OnceLock<Option<Regex>> = OnceLock::new();

    let fence = FENCE
        .get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").ok())
        .as_ref()?;
    if let Some(m) = fence.captures(text).and_then(|c| c.get(1)) {
        return Some(m.as_str());
    }
    let bare = BARE
        .get_or_init(|| Regex::new(r"(?s)(\{.*\})").ok())
        .as_ref()?;
    bare.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str())
}
