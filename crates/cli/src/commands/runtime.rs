//! Startup shared by every command: config, providers, index, pipeline.
//!
//! Everything here runs before the first question. Any failure aborts the
//! command with a non-zero exit.

use cvrag_config::{AppConfig, RetrievalMode};
use cvrag_core::{Language, Provider, Retriever};
use cvrag_index::{KeywordRetriever, VectorIndex, VectorRetriever};
use cvrag_pipeline::{RagPipeline, RagResult};
use cvrag_providers::ProviderRouter;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Load config from `path`, or from the default location.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => AppConfig::load_at(path),
        None => AppConfig::load(),
    }
    .map_err(|e| format!("Failed to load config: {e}"))?;
    Ok(config)
}

/// Fail early, with setup instructions, when no API key is available.
pub fn require_api_key(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.has_api_key() || config.default_provider == "ollama" {
        return Ok(());
    }

    eprintln!();
    eprintln!("  ERROR: No API key configured!");
    eprintln!();
    eprintln!("  Set one of these environment variables:");
    eprintln!("    export GROQ_API_KEY='gsk_...'     (recommended)");
    eprintln!("    export OPENAI_API_KEY='sk-...'    (for OpenAI direct)");
    eprintln!("    export CVRAG_API_KEY='...'        (generic)");
    eprintln!();
    eprintln!("  Or add it to your config file:");
    eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
    eprintln!();
    Err("No API key found. See above for setup instructions.".into())
}

/// Build the retriever for the configured mode over `index`.
///
/// In vector mode the embedder is exercised once, so a provider that cannot
/// embed, or embeds with the wrong dimension, fails startup.
pub async fn build_retriever(
    config: &AppConfig,
    index: Arc<VectorIndex>,
    embedder: Option<Arc<dyn Provider>>,
) -> Result<Arc<dyn Retriever>, Box<dyn std::error::Error>> {
    let settings = &config.index;

    let retriever: Arc<dyn Retriever> = match settings.mode {
        RetrievalMode::Vector => {
            let embedder = embedder.ok_or_else(|| {
                format!(
                    "Embedding provider '{}' is not configured",
                    config.embedding_provider()
                )
            })?;

            if let Some(stored) = index.embedding_model()
                && stored != settings.embedding_model
            {
                return Err(format!(
                    "Index was built with '{stored}' but config uses '{}'",
                    settings.embedding_model
                )
                .into());
            }

            let retriever = VectorRetriever::new(index, embedder, &settings.embedding_model)?
                .with_limits(settings.top_k, settings.fetch_k)
                .with_lambda(settings.mmr_lambda);

            let dimensions = retriever.check_embedder().await.map_err(|e| {
                format!(
                    "Embedding provider '{}' is unusable with '{}': {e}. \
                     Set index.embedding_provider or use mode = \"keyword\"",
                    config.embedding_provider(),
                    settings.embedding_model
                )
            })?;
            info!(dimensions, "Query embeddings verified");

            Arc::new(retriever)
        }
        RetrievalMode::Keyword => {
            Arc::new(KeywordRetriever::new(index).with_top_k(settings.top_k))
        }
    };

    Ok(retriever)
}

/// Build the pipeline from config: providers, index, retriever.
pub async fn build_pipeline(
    config: &AppConfig,
) -> Result<RagPipeline, Box<dyn std::error::Error>> {
    let router: ProviderRouter = cvrag_providers::build_from_config(config);
    let provider = router.default().ok_or("No default provider configured")?;

    let index = Arc::new(VectorIndex::load(&config.index.dir)?);
    let retriever =
        build_retriever(config, index, router.get(config.embedding_provider())).await?;

    info!(
        provider = router.default_name(),
        model = %config.default_model,
        retriever = retriever.name(),
        "Pipeline ready"
    );

    Ok(RagPipeline::from_config(config, provider, retriever))
}

/// The "sources" block shown under an answer.
pub fn render_sources(language: Language, result: &RagResult) -> String {
    let pack = language.pack();
    let mut out = format!(
        "  ── {} ──\n  {} {}\n",
        pack.sources_title, pack.reformulated_label, result.reformulated_question
    );

    if !result.context_preview.is_empty() {
        out.push_str(&format!("  {}\n", pack.excerpts_label));
        for (i, preview) in result.context_preview.iter().enumerate() {
            out.push_str(&format!("    {}. {}\n", i + 1, preview));
        }
    }

    out
}
