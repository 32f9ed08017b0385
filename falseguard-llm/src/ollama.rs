use crate::media::MediaPayload;
use crate::traits::{http_to_falseguard, LlmClient, LlmResponse};
use async_trait::async_trait;
use falseguard_common::{FalseguardError, Result};
use falseguard_http::{HttpClient, RequestOpts};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use std::time::Duration;

const OLLAMA_CONNECTION_ERROR: &str = "No running Ollama server detected. Start it with: `ollama serve` (after installing). Install instructions: https://github.com/ollama/ollama";

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
    eval_count: Option<u32>,
}

/// Ollama client for local model inference.
///
/// Expects a running Ollama server (see https://github.com/ollama/ollama).
/// Images are forwarded to multimodal models; PDFs are not supported.
pub struct OllamaClient {
    client: HttpClient,
    model: String,
}

impl OllamaClient {
    /// Create a new client and verify server/model availability.
    pub async fn new(base_url: &str, model: String) -> Result<Self> {
        let client = HttpClient::new(base_url)
            .map_err(|e| FalseguardError::Config(format!("Ollama endpoint: {e}")))?
            .with_timeout(Duration::from_secs(120))
            .with_retries(0);

        let ollama_client = Self { client, model };

        let models = ollama_client.fetch_available_models().await?;
        if !models.contains(&ollama_client.model) {
            tracing::info!("Model {} not found locally, pulling...", ollama_client.model);
            ollama_client.pull_model().await?;
        }

        Ok(ollama_client)
    }

    async fn fetch_available_models(&self) -> Result<Vec<String>> {
        let tags: TagsResponse = self
            .client
            .get_json("api/tags", RequestOpts::default())
            .await
            .map_err(|_| FalseguardError::Provider(OLLAMA_CONNECTION_ERROR.to_string()))?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    async fn pull_model(&self) -> Result<()> {
        let payload = json!({ "model": self.model, "stream": false });
        let _: JsonValue = self
            .client
            .post_json_opts(
                "api/pull",
                &payload,
                RequestOpts {
                    timeout: Some(Duration::from_secs(1800)),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| http_to_falseguard("Ollama", e))?;
        tracing::info!("Successfully pulled model: {}", self.model);
        Ok(())
    }

    async fn send(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        images: Option<Vec<&str>>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        let mut options = serde_json::Map::new();
        if let Some(temp) = temperature {
            options.insert("temperature".to_string(), json!(temp));
        }
        if let Some(max_tok) = max_tokens {
            options.insert("num_predict".to_string(), json!(max_tok));
        }

        let mut payload = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "format": "json",
            "options": options,
        });
        if let Some(sys) = system_prompt {
            payload["system"] = json!(sys);
        }
        if let Some(images) = images {
            payload["images"] = json!(images);
        }

        let resp: GenerateResponse = self
            .client
            .post_json("api/generate", None, &payload)
            .await
            .map_err(|e| http_to_falseguard("Ollama", e))?;

        Ok(LlmResponse {
            text: resp.response,
            model: Some(self.model.clone()),
            tokens_used: resp.eval_count,
        })
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        self.send(prompt, system_prompt, None, max_tokens, temperature)
            .await
    }

    async fn generate_with_media(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        media: &MediaPayload,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        if !media.is_image() {
            return Err(FalseguardError::Unsupported(format!(
                "Ollama accepts images only, got {}",
                media.mime_type()
            )));
        }
        self.send(
            prompt,
            system_prompt,
            Some(vec![media.base64_data()]),
            max_tokens,
            temperature,
        )
        .await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
