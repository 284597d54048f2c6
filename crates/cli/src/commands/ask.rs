//! `cvrag ask`: Answer a single question.

use super::runtime;
use cvrag_core::Language;
use cvrag_pipeline::{ChatSession, ReplyKind};
use std::path::Path;

pub async fn run(
    config_path: Option<&Path>,
    question: &str,
    lang: Option<Language>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = runtime::load_config(config_path)?;
    runtime::require_api_key(&config)?;
    let pipeline = runtime::build_pipeline(&config).await?;

    let language = lang.unwrap_or(config.language);
    let mut session = ChatSession::new(language, config.pipeline.history_limit);
    let reply = session.ask(&pipeline, question).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&reply)?);
    } else {
        println!("{}", reply.text);
        if let Some(result) = &reply.result {
            println!();
            print!("{}", runtime::render_sources(language, result));
        }
    }

    match reply.kind {
        ReplyKind::Answered => Ok(()),
        ReplyKind::Rejected => Err("Question rejected".into()),
        ReplyKind::Failed => Err("Request failed; run with --verbose for details".into()),
    }
}
