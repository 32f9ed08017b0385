//! FalseGuard analysis pipeline.
//!
//! ```text
//! request -> classify -> Question   -> answer_question
//!                     -> Real|Fake  -> explain + gather_evidence (-> search)
//! media   -> analyze_media
//! ```
//!
//! Stages depend only on [`falseguard_llm::service::ModelService`] and
//! [`falseguard_search::EvidenceSearchTool`], so both can be swapped for
//! scripted fakes.

pub mod error;
pub mod orchestrator;
pub mod prompts;
pub mod stages;
pub mod types;

pub use error::PipelineError;
pub use orchestrator::Orchestrator;
pub use types::{
    AnalysisOutcome, AnalysisRequest, Classification, EvidenceReport, Explanation, GeneralAnswer,
    Label, MediaVerdict, SupportingLink,
};
