use crate::error::PipelineError;
use crate::prompts;
use crate::types::MediaVerdict;
use falseguard_llm::media::MediaPayload;
use falseguard_llm::schema::{non_blank, unit_interval, SchemaViolation, StructuredOutput};
use falseguard_llm::service::{invoke_structured, ModelService, PromptCall};
use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct MediaOutput {
    /// Whether the file contains fake news indicators or the answer reveals misleading content
    is_fake_news: bool,
    /// Reasoning behind the classification, or the direct answer to the user's question
    reasoning: String,
    #[schemars(range(min = 0.0, max = 1.0))]
    confidence_score: f64,
    /// Evidence or quotes from the file supporting the analysis
    #[serde(default)]
    evidence: Option<String>,
}

impl StructuredOutput for MediaOutput {
    fn check(&self) -> Result<(), SchemaViolation> {
        non_blank("reasoning", &self.reasoning)?;
        unit_interval("confidenceScore", self.confidence_score)
    }
}

/// Judge an uploaded document or image, or answer `question` about it.
///
/// A blank question counts as no question.
pub async fn analyze_media(
    model: &dyn ModelService,
    payload: &MediaPayload,
    question: Option<&str>,
) -> Result<MediaVerdict, PipelineError> {
    let question = question.map(str::trim).filter(|q| !q.is_empty());
    tracing::info!(
        target: "pipeline.media",
        mime = payload.mime_type(),
        bytes = payload.decoded_len(),
        has_question = question.is_some(),
        "analyzing media"
    );

    let call = PromptCall::new::<MediaOutput>("analyze_media", prompts::media(question))
    .with_media(payload.clone());

    let out: MediaOutput = invoke_structured(model, &call).await?;
    Ok(MediaVerdict {
        is_fake_news: out.is_fake_news,
        reasoning: out.reasoning,
        confidence: out.confidence_score,
        evidence: out.evidence.filter(|e| !e.trim().is_empty()),
    })
}
