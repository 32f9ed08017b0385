use crate::media::MediaPayload;
use crate::traits::{http_to_falseguard, LlmClient, LlmResponse};
use async_trait::async_trait;
use falseguard_common::{FalseguardError, Result};
use falseguard_http::HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

const DEFAULT_INSTRUCTIONS: &str = "You are an objective, unbiased fact-checking assistant.";

pub struct OpenAiClient {
    client: HttpClient,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ResponsesApiRequest {
    model: String,
    input: Value,
    instructions: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ResponsesApiResponse {
    model: String,
    #[serde(default)]
    output: Vec<ResponseMessage>,
    usage: Option<ResponseUsage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Vec<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct ResponseUsage {
    total_tokens: Option<u32>,
}

impl OpenAiClient {
    /// Create a client for an OpenAI-compatible Responses endpoint.
    pub fn new(endpoint: &str, api_key: String, model: String) -> Result<Self> {
        let client = HttpClient::new(endpoint)
            .map_err(|e| FalseguardError::Config(format!("OpenAI endpoint: {e}")))?
            .with_timeout(Duration::from_secs(60));

        Ok(Self {
            client,
            api_key,
            model,
        })
    }

    async fn send(
        &self,
        input: Value,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        let req = ResponsesApiRequest {
            model: self.model.clone(),
            input,
            instructions: system_prompt.unwrap_or(DEFAULT_INSTRUCTIONS).to_string(),
            max_output_tokens: max_tokens,
            temperature,
        };

        let resp: ResponsesApiResponse = self
            .client
            .post_json("responses", Some(&self.api_key), &req)
            .await
            .map_err(|e| http_to_falseguard("OpenAI", e))?;

        let text = resp
            .output
            .iter()
            .flat_map(|msg| &msg.content)
            .filter(|c| c.kind == "output_text")
            .map(|c| c.text.as_str())
            .collect::<String>();

        if text.is_empty() {
            return Err(FalseguardError::Provider(
                "OpenAI response contained no output_text".to_string(),
            ));
        }

        Ok(LlmResponse {
            text,
            model: Some(resp.model),
            tokens_used: resp.usage.and_then(|u| u.total_tokens),
        })
    }
}

fn media_part(media: &MediaPayload) -> Value {
    if media.is_image() {
        json!({ "type": "input_image", "image_url": media.to_data_uri() })
    } else {
        json!({
            "type": "input_file",
            "filename": if media.is_pdf() { "upload.pdf" } else { "upload.bin" },
            "file_data": media.to_data_uri(),
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        self.send(json!(prompt), system_prompt, max_tokens, temperature)
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
        let input = json!([{
            "role": "user",
            "content": [
                media_part(media),
                { "type": "input_text", "text": prompt },
            ],
        }]);
        self.send(input, system_prompt, max_tokens, temperature)
            .await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn images_and_files_use_distinct_parts() {
        let img = MediaPayload::from_bytes("image/jpeg", b"jpg").unwrap();
        assert_eq!(media_part(&img)["type"], "input_image");

        let pdf = MediaPayload::from_bytes("application/pdf", b"%PDF").unwrap();
        let part = media_part(&pdf);
        assert_eq!(part["type"], "input_file");
        assert_eq!(part["filename"], "upload.pdf");
        assert!(part["file_data"]
            .as_str()
            .unwrap()
            .starts_with("data:application/pdf;base64,"));
    }
}
