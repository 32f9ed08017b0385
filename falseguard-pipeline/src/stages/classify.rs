use crate::error::PipelineError;
use crate::prompts;
use crate::types::{Classification, Label};
use falseguard_llm::schema::{unit_interval, SchemaViolation, StructuredOutput};
use falseguard_llm::service::{invoke_structured, ModelService, PromptCall};
use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Deserialize, JsonSchema)]
struct ClassifyOutput {
    /// The classification of the text, or Question if it is a question
    classification: Label,
    /// Confidence score in the classification (0-1)
    #[schemars(range(min = 0.0, max = 1.0))]
    confidence: f64,
}

impl StructuredOutput for ClassifyOutput {
    fn check(&self) -> Result<(), SchemaViolation> {
        unit_interval("confidence", self.confidence)
    }
}

pub async fn classify(
    model: &dyn ModelService,
    content: &str,
) -> Result<Classification, PipelineError> {
    let call = PromptCall::new::<ClassifyOutput>("classify_news", prompts::classify(content))
    .with_system(prompts::FACT_CHECK_SYSTEM_PROMPT)
    .with_temperature(0.0);

    let out: ClassifyOutput = invoke_structured(model, &call).await?;
    tracing::info!(
        target: "pipeline.classify",
        label = %out.classification,
        confidence = out.confidence,
        "classified"
    );
    Ok(Classification {
        label: out.classification,
        confidence: out.confidence,
    })
}
