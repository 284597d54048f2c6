//! `cvrag doctor`: Diagnose configuration, credentials and index.

use super::runtime;
use cvrag_config::{AppConfig, RetrievalMode};
use cvrag_index::VectorIndex;
use std::path::Path;
use std::sync::Arc;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 cvrag Doctor — System Diagnostics");
    println!("====================================\n");

    let mut issues = 0;

    // Check config
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));
    if path.exists() {
        println!("  ✅ Config file found at {}", path.display());
    } else {
        println!("  ⚠️  No config file at {} — using defaults", path.display());
    }

    let config = match runtime::load_config(config_path) {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ {e}");
            println!("\n  ⚠️  1 issue(s) found. See above for details.");
            return Ok(());
        }
    };

    println!(
        "  ✅ Provider: {} / {} (language: {})",
        config.default_provider, config.default_model, config.language
    );

    // Check API key
    if config.has_api_key() {
        println!("  ✅ API key configured");
    } else {
        println!("  ⚠️  No API key configured — set GROQ_API_KEY or add api_key to config.toml");
        issues += 1;
    }

    // Check index
    let mut embedded_index = None;
    match VectorIndex::load(&config.index.dir) {
        Ok(index) => {
            println!(
                "  ✅ Index loaded: {} fragments from {}",
                index.len(),
                config.index.dir.display()
            );
            if index.is_empty() {
                println!("  ⚠️  Index is empty — every answer will be the fallback message");
                issues += 1;
            }
            if config.index.mode == RetrievalMode::Vector {
                if !index.fully_embedded() {
                    println!("  ❌ Vector mode needs embeddings on every entry — use mode = \"keyword\"");
                    issues += 1;
                } else if let Some(stored) = index.embedding_model()
                    && stored != config.index.embedding_model
                {
                    println!(
                        "  ❌ Index built with '{stored}', config uses '{}'",
                        config.index.embedding_model
                    );
                    issues += 1;
                } else {
                    println!(
                        "  ✅ Embeddings: {} dimensions ({})",
                        index.dimensions().unwrap_or(0),
                        config.index.embedding_model
                    );
                    embedded_index = Some(Arc::new(index));
                }
            }
        }
        Err(e) => {
            println!("  ❌ {e}");
            issues += 1;
        }
    }

    // Check provider reachability
    if config.has_api_key() || config.default_provider == "ollama" {
        let router = cvrag_providers::build_from_config(&config);
        if let Some(provider) = router.default() {
            match provider.health_check().await {
                Ok(true) => println!("  ✅ Provider '{}' reachable", provider.name()),
                Ok(false) => {
                    println!("  ❌ Provider '{}' rejected the health check", provider.name());
                    issues += 1;
                }
                Err(e) => {
                    println!("  ❌ Provider '{}' unreachable: {e}", provider.name());
                    issues += 1;
                }
            }
        }

        // Check query embeddings
        if let Some(index) = embedded_index {
            let embedder = router.get(config.embedding_provider());
            match runtime::build_retriever(&config, index, embedder).await {
                Ok(_) => println!(
                    "  ✅ Query embeddings from '{}' match the index",
                    config.embedding_provider()
                ),
                Err(e) => {
                    println!("  ❌ {e}");
                    issues += 1;
                }
            }
        }
    } else if embedded_index.is_some() {
        println!("  ⚠️  Query embeddings not checked without an API key");
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
