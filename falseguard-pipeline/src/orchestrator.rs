use crate::error::PipelineError;
use crate::stages;
use crate::types::{AnalysisOutcome, AnalysisRequest, Label, MediaVerdict};
use falseguard_llm::media::MediaPayload;
use falseguard_llm::service::ModelService;
use falseguard_search::EvidenceSearchTool;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Routes a request through the stages.
///
/// Stateless between requests; clone freely and share across tasks.
#[derive(Clone)]
pub struct Orchestrator {
    model: Arc<dyn ModelService>,
    search: Arc<dyn EvidenceSearchTool>,
}

impl Orchestrator {
    pub fn new(model: Arc<dyn ModelService>, search: Arc<dyn EvidenceSearchTool>) -> Self {
        Self { model, search }
    }

    /// Classify, then either answer the question or explain and gather
    /// evidence. Explanation and evidence run concurrently; the first error
    /// fails the request.
    pub async fn classify_and_explain(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisOutcome, PipelineError> {
        let request_id = Uuid::new_v4();
        let started = Instant::now();
        tracing::info!(
            target: "pipeline.orchestrator",
            %request_id,
            content_len = request.content().len(),
            has_source_url = request.source_url().is_some(),
            "analysis.start"
        );

        let result = self.run_analysis(request).await;
        match &result {
            Ok(outcome) => tracing::info!(
                target: "pipeline.orchestrator",
                %request_id,
                label = %outcome.classification().label,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "analysis.done"
            ),
            Err(e) => tracing::warn!(
                target: "pipeline.orchestrator",
                %request_id,
                error = %e,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "analysis.failed"
            ),
        }
        result
    }

    async fn run_analysis(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisOutcome, PipelineError> {
        let model = self.model.as_ref();
        let classification = stages::classify(model, request.content()).await?;

        match classification.label {
            Label::Question => {
                let answer = stages::answer_question(model, request.content()).await?;
                Ok(AnalysisOutcome::GeneralAnswer {
                    classification,
                    answer,
                })
            }
            label @ (Label::Real | Label::Fake) => {
                let (explanation, evidence) = tokio::try_join!(
                    stages::explain(model, request.content(), label),
                    stages::gather_evidence(model, self.search.as_ref(), request, label),
                )?;
                Ok(AnalysisOutcome::Analysis {
                    classification,
                    explanation,
                    evidence,
                })
            }
        }
    }

    /// Like [`Self::classify_and_explain`], abandoning in-flight calls when
    /// `cancel` fires.
    pub async fn classify_and_explain_with_cancel(
        &self,
        request: &AnalysisRequest,
        cancel: &CancellationToken,
    ) -> Result<AnalysisOutcome, PipelineError> {
        with_cancel(cancel, self.classify_and_explain(request)).await
    }

    pub async fn analyze_media(
        &self,
        payload: &MediaPayload,
        question: Option<&str>,
    ) -> Result<MediaVerdict, PipelineError> {
        let request_id = Uuid::new_v4();
        tracing::info!(target: "pipeline.orchestrator", %request_id, "media.start");
        let verdict = stages::analyze_media(self.model.as_ref(), payload, question).await?;
        tracing::info!(
            target: "pipeline.orchestrator",
            %request_id,
            is_fake_news = verdict.is_fake_news,
            "media.done"
        );
        Ok(verdict)
    }

    /// Entry point for callers that hold media as a `data:<mime>;base64,<data>`
    /// string, the form browser uploads arrive in.
    ///
    /// An envelope without a MIME type or with invalid base64 is rejected as
    /// [`PipelineError::Validation`] before any model call. Size and type
    /// limits are still the caller's; the CLI reads files and goes through
    /// [`Orchestrator::analyze_media`] directly.
    pub async fn analyze_media_uri(
        &self,
        data_uri: &str,
        question: Option<&str>,
    ) -> Result<MediaVerdict, PipelineError> {
        let payload = MediaPayload::from_data_uri(data_uri)
            .map_err(|e| PipelineError::Validation(format!("media payload: {e}")))?;
        self.analyze_media(&payload, question).await
    }

    pub async fn analyze_media_with_cancel(
        &self,
        payload: &MediaPayload,
        question: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<MediaVerdict, PipelineError> {
        with_cancel(cancel, self.analyze_media(payload, question)).await
    }
}

async fn with_cancel<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, PipelineError>
where
    F: Future<Output = Result<T, PipelineError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::info!(target: "pipeline.orchestrator", "request cancelled");
            Err(PipelineError::Cancelled)
        }
        res = fut => res,
    }
}
