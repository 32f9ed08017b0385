use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use falseguard_common::observability::init_logging;
use falseguard_config::{FalseguardConfig, FalseguardConfigLoader};
use falseguard_pipeline::AnalysisRequest;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

mod media;
mod render;
mod wiring;

const DEFAULT_CONFIG: &str = "falseguard.yaml";

#[derive(Parser, Debug)]
#[command(name = "falseguard")]
#[command(version, about = "Check news text or media for misinformation")]
struct Cli {
    /// Configuration file (YAML). Defaults to ./falseguard.yaml when present.
    #[arg(long, global = true, env = "FALSEGUARD_CONFIG")]
    config: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify text, then explain it and gather web evidence (or answer it
    /// if it is a question)
    Check {
        /// Article text or question
        text: String,
        /// Where the article was published
        #[arg(long)]
        url: Option<String>,
    },
    /// Analyze a PDF or image
    Media {
        file: PathBuf,
        /// Ask something specific about the file instead of a general check
        #[arg(long)]
        question: Option<String>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<FalseguardConfig> {
    let loader = match path {
        Some(p) => FalseguardConfigLoader::new().with_file(p),
        None => FalseguardConfigLoader::new().with_optional_file(DEFAULT_CONFIG),
    };
    loader.load().context("failed to load configuration")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config first; env wins over the file.
    let cfg = load_config(cli.config.as_ref())?;
    let log_path = init_logging(cfg.logging.to_log_config())?;
    tracing::debug!(log = %log_path.display(), "logging initialised");

    let orchestrator = wiring::build_orchestrator(&cfg).await?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("ctrl-c received, cancelling");
            on_signal.cancel();
        }
    });

    match cli.command {
        Commands::Check { text, url } => {
            let request = AnalysisRequest::new(text, url.as_deref())?;
            let outcome = orchestrator
                .classify_and_explain_with_cancel(&request, &cancel)
                .await?;
            render::print_outcome(&outcome, cli.json)?;
        }
        Commands::Media { file, question } => {
            let payload = media::load_media(&file, &cfg.media)?;
            let verdict = orchestrator
                .analyze_media_with_cancel(&payload, question.as_deref(), &cancel)
                .await?;
            render::print_verdict(&verdict, cli.json)?;
        }
    }
    Ok(())
}
