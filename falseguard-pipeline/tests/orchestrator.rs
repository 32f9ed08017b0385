mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FakeSearch, ScriptedModel};
use falseguard_pipeline::stages::FALLBACK_COUNTER_RESPONSE;
use falseguard_pipeline::{AnalysisOutcome, AnalysisRequest, Label, Orchestrator, PipelineError};
use falseguard_search::{SearchOutcome, TavilySearchTool};
use serde_json::json;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

const CHOCOLATE: &str = "BREAKING: Scientists confirm that eating chocolate every day cures cancer, \
     doctors stunned as hospitals begin prescribing candy bars.";

fn fake_news_model() -> ScriptedModel {
    ScriptedModel::new()
        .reply(
            "classify_news",
            json!({"classification": "Fake", "confidence": 0.93}),
        )
        .reply(
            "explain_classification",
            json!({
                "explanation": "No peer-reviewed study supports a cure.",
                "confidenceScore": 0.88,
                "evidence": "Cancer research bodies have published no such finding."
            }),
        )
        .reply(
            "synthesize_search_query",
            json!({"query": "chocolate cures cancer fact check"}),
        )
        .reply(
            "provide_evidence",
            json!({
                "counterResponse": "Sources show chocolate does not cure cancer.",
                "confidenceScore": 0.9
            }),
        )
}

fn orchestrator(model: &Arc<ScriptedModel>, search: &Arc<FakeSearch>) -> Orchestrator {
    Orchestrator::new(model.clone(), search.clone())
}

#[tokio::test]
async fn question_is_answered_without_evidence() {
    common::init_test_tracing();
    let model = Arc::new(
        ScriptedModel::new()
            .reply(
                "classify_news",
                json!({"classification": "Question", "confidence": 0.97}),
            )
            .reply(
                "answer_question",
                json!({"answer": "Photosynthesis is how plants turn light into chemical energy."}),
            ),
    );
    let search = Arc::new(FakeSearch::with_results(&[]));

    let request = AnalysisRequest::new("What is photosynthesis?", None).unwrap();
    let outcome = orchestrator(&model, &search)
        .classify_and_explain(&request)
        .await
        .unwrap();

    match outcome {
        AnalysisOutcome::GeneralAnswer {
            classification,
            answer,
        } => {
            assert_eq!(classification.label, Label::Question);
            assert!(!answer.answer.trim().is_empty());
        }
        other => panic!("expected a general answer, got {other:?}"),
    }
    assert_eq!(model.call_names(), vec!["classify_news", "answer_question"]);
    assert!(search.queries().is_empty());
}

#[tokio::test]
async fn fake_headline_links_come_from_search_results() {
    common::init_test_tracing();
    let model = Arc::new(fake_news_model());
    let search = Arc::new(FakeSearch::with_results(&[
        ("Chocolate does not cure cancer", "https://factcheck.example/chocolate"),
        ("Cocoa and health: a review", "https://journal.example/cocoa"),
        ("Cancer treatment myths", "https://health.example/myths"),
    ]));

    let request = AnalysisRequest::new(CHOCOLATE, Some("https://dubious.example/story")).unwrap();
    let outcome = orchestrator(&model, &search)
        .classify_and_explain(&request)
        .await
        .unwrap();

    let AnalysisOutcome::Analysis {
        classification,
        explanation,
        evidence,
    } = outcome
    else {
        panic!("expected an analysis");
    };
    assert_eq!(classification.label, Label::Fake);
    assert_eq!(explanation.confidence, 0.88);
    assert!(explanation.evidence_text.is_some());

    assert_eq!(search.queries(), vec!["chocolate cures cancer fact check"]);
    assert_eq!(evidence.supporting_links.len(), 3);
    assert_eq!(evidence.supporting_links[0].title, "Chocolate does not cure cancer");
    assert_eq!(evidence.supporting_links[2].url, "https://health.example/myths");
    assert_eq!(
        evidence.counter_response,
        "Sources show chocolate does not cure cancer."
    );

    assert_eq!(model.count("provide_evidence"), 1);
    let prompt = model.prompt_of("provide_evidence").unwrap();
    assert!(prompt.contains("https://factcheck.example/chocolate"));
    assert!(prompt.contains("Source URL: https://dubious.example/story"));
}

#[tokio::test]
async fn missing_search_credential_degrades_to_error_report() {
    common::init_test_tracing();
    let model = Arc::new(fake_news_model());
    let tavily = TavilySearchTool::new("https://api.tavily.com", None, 5).unwrap();
    let orchestrator = Orchestrator::new(model.clone(), Arc::new(tavily));

    let request = AnalysisRequest::new(CHOCOLATE, None).unwrap();
    let outcome = orchestrator.classify_and_explain(&request).await.unwrap();

    let AnalysisOutcome::Analysis { evidence, .. } = outcome else {
        panic!("expected an analysis");
    };
    assert!(evidence.supporting_links.is_empty());
    assert!(evidence.counter_response.contains("API key"));
    assert!(evidence.counter_response.contains("TAVILY_API_KEY"));
    assert_eq!(model.count("provide_evidence"), 0);
}

#[tokio::test]
async fn empty_results_say_no_sources_were_found() {
    let model = Arc::new(fake_news_model());
    let search = Arc::new(FakeSearch::new(SearchOutcome::Results(vec![])));

    let request = AnalysisRequest::new(CHOCOLATE, None).unwrap();
    let outcome = orchestrator(&model, &search)
        .classify_and_explain(&request)
        .await
        .unwrap();

    let AnalysisOutcome::Analysis { evidence, .. } = outcome else {
        panic!("expected an analysis");
    };
    assert!(evidence.supporting_links.is_empty());
    assert!(evidence
        .counter_response
        .contains("No relevant supporting sources could be found"));
    assert_eq!(search.queries().len(), 1);
}

#[tokio::test]
async fn real_label_still_gathers_evidence_once() {
    let model = Arc::new(
        fake_news_model().reply(
            "classify_news",
            json!({"classification": "Real", "confidence": 0.7}),
        ),
    );
    let search = Arc::new(FakeSearch::with_results(&[(
        "Official report",
        "https://gov.example/report",
    )]));

    let request = AnalysisRequest::new("Parliament passed the budget on Tuesday.", None).unwrap();
    let outcome = orchestrator(&model, &search)
        .classify_and_explain(&request)
        .await
        .unwrap();

    assert_eq!(outcome.classification().label, Label::Real);
    assert_eq!(search.queries().len(), 1);
    assert_eq!(model.count("explain_classification"), 1);
    assert_eq!(model.count("provide_evidence"), 1);
}

#[tokio::test]
async fn broken_evidence_output_falls_back_without_failing_request() {
    let model = Arc::new(fake_news_model().reply(
        "provide_evidence",
        json!({"counterResponse": "ok", "confidenceScore": 3.0}),
    ));
    let search = Arc::new(FakeSearch::with_results(&[(
        "A source",
        "https://source.example/a",
    )]));

    let request = AnalysisRequest::new(CHOCOLATE, None).unwrap();
    let outcome = orchestrator(&model, &search)
        .classify_and_explain(&request)
        .await
        .unwrap();

    let AnalysisOutcome::Analysis { evidence, .. } = outcome else {
        panic!("expected an analysis");
    };
    assert_eq!(evidence.counter_response, FALLBACK_COUNTER_RESPONSE);
    assert_eq!(evidence.confidence, 0.0);
    assert!(evidence.supporting_links.is_empty());
}

#[tokio::test]
async fn failed_query_synthesis_still_searches_once() {
    let model = Arc::new(fake_news_model().fail("synthesize_search_query", "upstream 500"));
    let search = Arc::new(FakeSearch::with_results(&[(
        "A source",
        "https://source.example/a",
    )]));

    let request = AnalysisRequest::new(CHOCOLATE, None).unwrap();
    orchestrator(&model, &search)
        .classify_and_explain(&request)
        .await
        .unwrap();

    let queries = search.queries();
    assert_eq!(queries.len(), 1);
    assert!(queries[0].starts_with("BREAKING: Scientists confirm"));
    assert!(queries[0].split_whitespace().count() <= 10);
}

#[tokio::test]
async fn too_short_synthesized_query_is_replaced_by_content_words() {
    let model = Arc::new(
        fake_news_model().reply("synthesize_search_query", json!({"query": "chocolate cancer"})),
    );
    let search = Arc::new(FakeSearch::with_results(&[(
        "A source",
        "https://source.example/a",
    )]));

    let request = AnalysisRequest::new(CHOCOLATE, None).unwrap();
    orchestrator(&model, &search)
        .classify_and_explain(&request)
        .await
        .unwrap();

    assert_eq!(
        search.queries(),
        vec!["BREAKING: Scientists confirm that eating chocolate every day cures cancer,"]
    );
}

#[tokio::test]
async fn supporting_links_keep_provider_url_spelling() {
    let model = Arc::new(fake_news_model());
    let search = Arc::new(FakeSearch::with_results(&[
        ("Mixed case host", "https://News.Example.COM"),
        ("Raw path", "https://x.example/a b?q=1#frag"),
    ]));

    let request = AnalysisRequest::new(CHOCOLATE, None).unwrap();
    let outcome = orchestrator(&model, &search)
        .classify_and_explain(&request)
        .await
        .unwrap();

    let AnalysisOutcome::Analysis { evidence, .. } = outcome else {
        panic!("expected an analysis");
    };
    let urls: Vec<&str> = evidence
        .supporting_links
        .iter()
        .map(|l| l.url.as_str())
        .collect();
    assert_eq!(
        urls,
        vec!["https://News.Example.COM", "https://x.example/a b?q=1#frag"]
    );
}

#[tokio::test]
async fn out_of_range_confidence_fails_the_request() {
    let model = Arc::new(ScriptedModel::new().reply(
        "classify_news",
        json!({"classification": "Fake", "confidence": 1.5}),
    ));
    let search = Arc::new(FakeSearch::with_results(&[]));

    let request = AnalysisRequest::new(CHOCOLATE, None).unwrap();
    let err = orchestrator(&model, &search)
        .classify_and_explain(&request)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Generation(ref e) if e.call() == "classify_news"));
    assert!(search.queries().is_empty());
}

#[tokio::test]
async fn explanation_failure_fails_the_request() {
    let model = Arc::new(fake_news_model().reply(
        "explain_classification",
        json!({"explanation": "", "confidenceScore": 0.5}),
    ));
    let search = Arc::new(FakeSearch::with_results(&[]));

    let request = AnalysisRequest::new(CHOCOLATE, None).unwrap();
    let err = orchestrator(&model, &search)
        .classify_and_explain(&request)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Generation(_)));
}

#[tokio::test]
async fn explanation_and_evidence_run_concurrently() {
    let searched = Arc::new(Notify::new());
    let model = Arc::new(fake_news_model().gate("explain_classification", searched.clone()));
    let search = Arc::new(
        FakeSearch::with_results(&[("A source", "https://source.example/a")])
            .notify_on_search(searched),
    );

    let request = AnalysisRequest::new(CHOCOLATE, None).unwrap();
    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        orchestrator(&model, &search).classify_and_explain(&request),
    )
    .await
    .expect("explanation waited on a search that never ran")
    .unwrap();
    assert!(matches!(outcome, AnalysisOutcome::Analysis { .. }));
}

#[tokio::test]
async fn cancellation_abandons_in_flight_calls() {
    let never = Arc::new(Notify::new());
    let model = Arc::new(fake_news_model().gate("classify_news", never));
    let search = Arc::new(FakeSearch::with_results(&[]));
    let orchestrator = orchestrator(&model, &search);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let request = AnalysisRequest::new(CHOCOLATE, None).unwrap();
    let err = orchestrator
        .classify_and_explain_with_cancel(&request, &cancel)
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
    assert!(search.queries().is_empty());
}
