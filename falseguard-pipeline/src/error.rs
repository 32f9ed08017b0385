use falseguard_llm::service::GenerationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Caller input rejected before any stage ran.
    #[error("invalid request: {0}")]
    Validation(String),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// A stage was called with input it does not accept.
    #[error("stage precondition failed: {0}")]
    Precondition(String),

    #[error("request cancelled")]
    Cancelled,
}

impl PipelineError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineError::Cancelled)
    }
}
