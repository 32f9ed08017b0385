use crate::error::PipelineError;
use crate::prompts;
use crate::types::GeneralAnswer;
use falseguard_llm::schema::{non_blank, SchemaViolation, StructuredOutput};
use falseguard_llm::service::{invoke_structured, ModelService, PromptCall};
use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Deserialize, JsonSchema)]
struct AnswerOutput {
    answer: String,
}

impl StructuredOutput for AnswerOutput {
    fn check(&self) -> Result<(), SchemaViolation> {
        non_blank("answer", &self.answer)
    }
}

pub async fn answer_question(
    model: &dyn ModelService,
    question: &str,
) -> Result<GeneralAnswer, PipelineError> {
    let call = PromptCall::new::<AnswerOutput>("answer_question", prompts::answer_question(question));
    let out: AnswerOutput = invoke_structured(model, &call).await?;
    Ok(GeneralAnswer { answer: out.answer })
}
