use anyhow::{Context, Result};
use falseguard_config::FalseguardConfig;
use falseguard_llm::ensure_llm_ready;
use falseguard_llm::service::LlmModelService;
use falseguard_pipeline::Orchestrator;
use std::sync::Arc;

/// Build the model service and search tool named in `cfg`.
pub async fn build_orchestrator(cfg: &FalseguardConfig) -> Result<Orchestrator> {
    let client = ensure_llm_ready(&cfg.llm)
        .await
        .with_context(|| format!("{} model is not ready", cfg.llm.provider_name()))?;
    let (temperature, max_tokens) = cfg.llm.sampling();
    let model = LlmModelService::new(client).with_defaults(temperature, max_tokens);

    let search =
        falseguard_search::from_config(&cfg.search).context("failed to build search tool")?;

    tracing::info!(
        llm = cfg.llm.provider_name(),
        search = search.provider(),
        "orchestrator ready"
    );
    Ok(Orchestrator::new(Arc::new(model), search))
}
