mod common;

use falseguard_common::FalseguardError;
use falseguard_llm::gemini::GeminiClient;
use falseguard_llm::media::MediaPayload;
use falseguard_llm::traits::LlmClient;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "gemini-2.0-flash";

fn client_for(server: &MockServer) -> GeminiClient {
    let endpoint = format!("{}/v1beta", server.uri());
    GeminiClient::new(&endpoint, "test-key".to_string(), MODEL.to_string()).unwrap()
}

#[tokio::test]
async fn joins_candidate_parts_and_reports_usage() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "systemInstruction": { "parts": [{ "text": "be brief" }] },
            "generationConfig": { "maxOutputTokens": 64 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "{\"label\":" }, { "text": "\"Real\"}" }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "totalTokenCount": 42 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resp = client_for(&server)
        .generate("classify this", Some("be brief"), Some(64), None)
        .await
        .unwrap();

    assert_eq!(resp.text, "{\"label\":\"Real\"}");
    assert_eq!(resp.tokens_used, Some(42));
    assert_eq!(resp.model.as_deref(), Some(MODEL));
}

#[tokio::test]
async fn sends_media_as_inline_data() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .and(body_partial_json(json!({
            "contents": [{ "parts": [
                { "inlineData": { "mimeType": "application/pdf", "data": "JVBERg==" } },
                { "text": "summarize" }
            ]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "ok" }] } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let media = MediaPayload::from_base64("application/pdf", "JVBERg==").unwrap();
    let resp = client_for(&server)
        .generate_with_media("summarize", None, &media, None, None)
        .await
        .unwrap();
    assert_eq!(resp.text, "ok");
}

#[tokio::test]
async fn safety_block_is_a_provider_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "finishReason": "SAFETY" }]
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .generate("anything", None, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, FalseguardError::Provider(ref m) if m.contains("safety")));
}

#[tokio::test]
async fn bad_key_maps_to_readable_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "message": "API key not valid" }
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .generate("anything", None, None, None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("invalid API key"));
}
