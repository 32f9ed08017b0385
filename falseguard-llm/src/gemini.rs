use crate::media::MediaPayload;
use crate::traits::{http_to_falseguard, LlmClient, LlmResponse};
use async_trait::async_trait;
use falseguard_common::{FalseguardError, Result};
use falseguard_http::{Auth, HttpClient, RequestOpts};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
    safety_settings: Vec<GeminiSafetySetting>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    InlineData {
        inline_data: GeminiBlob,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiBlob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct GeminiSafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsageMetadata>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    total_token_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

/// Google Gemini API client.
///
/// Requires a valid API key and internet access. The default model for
/// FalseGuard; the only built-in provider that reads PDFs and images natively.
pub struct GeminiClient {
    client: HttpClient,
    api_key: String,
    model: String,
}

impl GeminiClient {
    /// Create a new client for `endpoint` (e.g. `https://generativelanguage.googleapis.com/v1beta`).
    pub fn new(endpoint: &str, api_key: String, model: String) -> Result<Self> {
        let client = HttpClient::new(endpoint)
            .map_err(|e| FalseguardError::Config(format!("Gemini endpoint: {e}")))?
            .with_timeout(Duration::from_secs(60));

        Ok(Self {
            client,
            api_key,
            model,
        })
    }

    // Fact-checking prompts quote the harmful claims they debunk, so the
    // dangerous-content and hate-speech filters are relaxed.
    fn safety_settings() -> Vec<GeminiSafetySetting> {
        vec![
            GeminiSafetySetting {
                category: "HARM_CATEGORY_HATE_SPEECH",
                threshold: "BLOCK_ONLY_HIGH",
            },
            GeminiSafetySetting {
                category: "HARM_CATEGORY_DANGEROUS_CONTENT",
                threshold: "BLOCK_NONE",
            },
            GeminiSafetySetting {
                category: "HARM_CATEGORY_HARASSMENT",
                threshold: "BLOCK_MEDIUM_AND_ABOVE",
            },
            GeminiSafetySetting {
                category: "HARM_CATEGORY_SEXUALLY_EXPLICIT",
                threshold: "BLOCK_LOW_AND_ABOVE",
            },
        ]
    }

    async fn send(
        &self,
        parts: Vec<GeminiPart>,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        let generation_config = if max_tokens.is_some() || temperature.is_some() {
            Some(GeminiGenerationConfig {
                temperature,
                max_output_tokens: max_tokens,
            })
        } else {
            None
        };

        let request = GeminiRequest {
            contents: vec![GeminiContent { parts }],
            generation_config,
            safety_settings: Self::safety_settings(),
            system_instruction: system_prompt.map(|s| GeminiContent {
                parts: vec![GeminiPart::Text {
                    text: s.to_string(),
                }],
            }),
        };

        let path = format!("models/{}:generateContent", self.model);
        tracing::debug!(target: "llm.gemini", model = %self.model, "gemini.generate");

        let resp: GeminiResponse = self
            .client
            .post_json_opts(
                &path,
                &request,
                RequestOpts {
                    auth: Some(
                        Auth::header("x-goog-api-key", &self.api_key)
                            .map_err(|e| FalseguardError::Config(e.to_string()))?,
                    ),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| http_to_falseguard("Gemini", e))?;

        if let Some(reason) = resp.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(FalseguardError::Provider(format!(
                "Gemini blocked the prompt: {reason}"
            )));
        }

        let candidate = resp.candidates.into_iter().next().ok_or_else(|| {
            FalseguardError::Provider("No candidates returned from Gemini".to_string())
        })?;

        if candidate.finish_reason.as_deref() == Some("SAFETY") {
            return Err(FalseguardError::Provider(
                "Content blocked by Gemini safety filters".to_string(),
            ));
        }

        let text: String = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|p| p.text)
            .collect();

        if text.is_empty() {
            return Err(FalseguardError::Provider(
                "No content parts in Gemini response".to_string(),
            ));
        }

        Ok(LlmResponse {
            text,
            model: Some(self.model.clone()),
            tokens_used: resp.usage_metadata.and_then(|u| u.total_token_count),
        })
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        let parts = vec![GeminiPart::Text {
            text: prompt.to_string(),
        }];
        self.send(parts, system_prompt, max_tokens, temperature)
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
        let parts = vec![
            GeminiPart::InlineData {
                inline_data: GeminiBlob {
                    mime_type: media.mime_type().to_string(),
                    data: media.base64_data().to_string(),
                },
            },
            GeminiPart::Text {
                text: prompt.to_string(),
            },
        ];
        self.send(parts, system_prompt, max_tokens, temperature)
            .await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
