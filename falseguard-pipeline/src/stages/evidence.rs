//! Evidence gathering: synthesize a query, search exactly once, then write a
//! counter-response grounded in what came back.
//!
//! The search result decides the shape of the report:
//!
//! | outcome         | counter-response                   | links          |
//! |-----------------|------------------------------------|----------------|
//! | error           | reports the failure, credential tip | none           |
//! | no results      | no sources were found               | none           |
//! | results         | written by the model from results   | the results    |
//!
//! Links are always copied from the search outcome, never from model text.
//! If the final model call does not produce a valid structure the stage
//! returns [`FALLBACK_COUNTER_RESPONSE`] with confidence 0.0 and no links.

use crate::error::PipelineError;
use crate::prompts;
use crate::types::{AnalysisRequest, EvidenceReport, Label, SupportingLink};
use falseguard_llm::schema::{non_blank, unit_interval, SchemaViolation, StructuredOutput};
use falseguard_llm::service::{invoke_structured, ModelService, PromptCall};
use falseguard_search::{EvidenceSearchTool, SearchOutcome, SearchResult};
use schemars::JsonSchema;
use serde::Deserialize;

pub const FALLBACK_COUNTER_RESPONSE: &str =
    "The AI model failed to return a valid analysis. Please try again.";

const QUERY_MIN_WORDS: usize = 5;
const QUERY_MAX_WORDS: usize = 10;

#[derive(Debug, Deserialize, JsonSchema)]
struct QueryOutput {
    /// A 5-10 word web search query
    query: String,
}

impl StructuredOutput for QueryOutput {
    fn check(&self) -> Result<(), SchemaViolation> {
        non_blank("query", &self.query)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct EvidenceOutput {
    /// Counter-response grounded in the search results
    counter_response: String,
    /// Confidence in the counter-response (0-1)
    #[schemars(range(min = 0.0, max = 1.0))]
    confidence_score: f64,
}

impl StructuredOutput for EvidenceOutput {
    fn check(&self) -> Result<(), SchemaViolation> {
        non_blank("counterResponse", &self.counter_response)?;
        unit_interval("confidenceScore", self.confidence_score)
    }
}

pub async fn gather_evidence(
    model: &dyn ModelService,
    search: &dyn EvidenceSearchTool,
    request: &AnalysisRequest,
    label: Label,
) -> Result<EvidenceReport, PipelineError> {
    if label == Label::Question {
        return Err(PipelineError::Precondition(
            "evidence gathering requires a Real or Fake classification".to_string(),
        ));
    }

    let query = synthesize_query(model, request, label).await;
    let outcome = search.search(&query).await;

    match &outcome {
        SearchOutcome::Error(reason) => {
            tracing::warn!(
                target: "pipeline.evidence",
                provider = search.provider(),
                %reason,
                "search failed; reporting degraded result"
            );
            Ok(search_failed_report(search.provider(), reason))
        }
        SearchOutcome::Results(results) if results.is_empty() => {
            tracing::info!(target: "pipeline.evidence", %query, "search returned no results");
            Ok(no_sources_report(&query))
        }
        SearchOutcome::Results(results) => {
            tracing::info!(
                target: "pipeline.evidence",
                %query,
                hit_count = results.len(),
                "search returned results"
            );
            let call = PromptCall::new::<EvidenceOutput>(
                "provide_evidence",
                prompts::evidence(
                    request.content(),
                    label,
                    request.source_url(),
                    &query,
                    &outcome,
                ),
            )
            .with_system(prompts::FACT_CHECK_SYSTEM_PROMPT);

            match invoke_structured::<EvidenceOutput>(model, &call).await {
                Ok(out) => Ok(EvidenceReport {
                    counter_response: out.counter_response.trim().to_string(),
                    supporting_links: links_from(results),
                    confidence: out.confidence_score,
                }),
                Err(e) => {
                    tracing::warn!(
                        target: "pipeline.evidence",
                        error = %e,
                        "evidence generation failed; returning fallback report"
                    );
                    Ok(fallback_report())
                }
            }
        }
    }
}

/// Ask the model for a search query. A failed call, or a query shorter than
/// five words, falls back to a query cut from the content so the search
/// still runs.
async fn synthesize_query(model: &dyn ModelService, request: &AnalysisRequest, label: Label) -> String {
    let call = PromptCall::new::<QueryOutput>(
        "synthesize_search_query",
        prompts::search_query(request.content(), label, request.source_url()),
    )
    .with_temperature(0.0);

    match invoke_structured::<QueryOutput>(model, &call).await {
        Ok(out) if out.query.split_whitespace().count() >= QUERY_MIN_WORDS => {
            clamp_words(&out.query)
        }
        Ok(out) => {
            tracing::warn!(
                target: "pipeline.evidence",
                query = %out.query,
                "synthesized query too short; deriving query from content"
            );
            clamp_words(request.content())
        }
        Err(e) => {
            tracing::warn!(
                target: "pipeline.evidence",
                error = %e,
                "query synthesis failed; deriving query from content"
            );
            clamp_words(request.content())
        }
    }
}

fn clamp_words(text: &str) -> String {
    text.split_whitespace()
        .take(QUERY_MAX_WORDS)
        .collect::<Vec<_>>()
        .join(" ")
}

fn links_from(results: &[SearchResult]) -> Vec<SupportingLink> {
    results
        .iter()
        .map(|r| SupportingLink {
            title: r.title.clone(),
            url: r.url.clone(),
        })
        .collect()
}

fn search_failed_report(provider: &str, reason: &str) -> EvidenceReport {
    EvidenceReport {
        counter_response: format!(
            "The live web search failed, so the claims could not be checked against current sources. \
             Please check that your {provider} API key is configured correctly and that you have an internet connection. \
             Details: {reason}"
        ),
        supporting_links: Vec::new(),
        confidence: 0.0,
    }
}

fn no_sources_report(query: &str) -> EvidenceReport {
    EvidenceReport {
        counter_response: format!(
            "No relevant supporting sources could be found on the web after a live search for \"{query}\"."
        ),
        supporting_links: Vec::new(),
        confidence: 0.0,
    }
}

fn fallback_report() -> EvidenceReport {
    EvidenceReport {
        counter_response: FALLBACK_COUNTER_RESPONSE.to_string(),
        supporting_links: Vec::new(),
        confidence: 0.0,
    }
}
