use crate::error::PipelineError;
use crate::prompts;
use crate::types::{Explanation, Label};
use falseguard_llm::schema::{non_blank, unit_interval, SchemaViolation, StructuredOutput};
use falseguard_llm::service::{invoke_structured, ModelService, PromptCall};
use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ExplainOutput {
    /// A concise explanation justifying the classification
    explanation: String,
    /// How sure you are that the classification is correct (0-1)
    #[schemars(range(min = 0.0, max = 1.0))]
    confidence_score: f64,
    /// Evidence supporting the classification, if available
    #[serde(default)]
    evidence: Option<String>,
}

impl StructuredOutput for ExplainOutput {
    fn check(&self) -> Result<(), SchemaViolation> {
        non_blank("explanation", &self.explanation)?;
        unit_interval("confidenceScore", self.confidence_score)
    }
}

/// Justify a Real/Fake label. No tool use.
pub async fn explain(
    model: &dyn ModelService,
    content: &str,
    label: Label,
) -> Result<Explanation, PipelineError> {
    if label == Label::Question {
        return Err(PipelineError::Precondition(
            "explanation requires a Real or Fake classification".to_string(),
        ));
    }

    let call = PromptCall::new::<ExplainOutput>(
        "explain_classification",
        prompts::explain(content, label),
    )
    .with_system(prompts::FACT_CHECK_SYSTEM_PROMPT);

    let out: ExplainOutput = invoke_structured(model, &call).await?;
    Ok(Explanation {
        text: out.explanation.trim().to_string(),
        confidence: out.confidence_score,
        evidence_text: out
            .evidence
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty()),
    })
}
