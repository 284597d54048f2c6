//! `cvrag chat`: Interactive conversation.

use super::runtime;
use cvrag_core::Language;
use cvrag_pipeline::{ChatSession, ReplyKind};
use std::io::Write;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(
    config_path: Option<&Path>,
    lang: Option<Language>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = runtime::load_config(config_path)?;
    runtime::require_api_key(&config)?;
    let pipeline = runtime::build_pipeline(&config).await?;

    let language = lang.unwrap_or(config.language);
    let mut session = ChatSession::new(language, config.pipeline.history_limit);

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║            cvrag — Interactive Mode            ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Provider:  {}", config.default_provider);
    println!("  Model:     {}", config.default_model);
    println!("  Index:     {}", config.index.dir.display());
    println!("  Retriever: {}", pipeline.retriever_name());
    println!("  Language:  {language}");
    println!();
    println!("  Type your question and press Enter.");
    println!("  Type '/lang pt' or '/lang en' to switch language.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    for line in language.pack().welcome_message.lines() {
        println!("  Assistant > {line}");
    }
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print!("  You > ");
    std::io::stdout().flush()?;

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();

        if matches!(input, "exit" | "quit" | "/exit" | "/quit" | ":q") {
            break;
        }

        if let Some(tag) = language_command(input) {
            match tag.parse::<Language>() {
                Ok(language) => {
                    session.set_language(language);
                    println!("  Language:  {language}");
                }
                Err(e) => eprintln!("  [Error] {e}"),
            }
            print!("  You > ");
            std::io::stdout().flush()?;
            continue;
        }

        eprint!("  ...");
        let reply = session.ask(&pipeline, &line).await;
        eprint!("\r     \r");

        println!();
        for text_line in reply.text.lines() {
            println!("  Assistant > {text_line}");
        }
        println!();

        if let (ReplyKind::Answered, Some(result)) = (reply.kind, &reply.result) {
            print!("{}", runtime::render_sources(session.language(), result));
            println!();
        }

        print!("  You > ");
        std::io::stdout().flush()?;
    }

    println!();
    println!("  Goodbye! 👋");
    println!();

    Ok(())
}

/// The tag of a `/lang <tag>` command, or `None` when `input` is not one.
fn language_command(input: &str) -> Option<&str> {
    let mut words = input.split_whitespace();
    if words.next() != Some("/lang") {
        return None;
    }
    Some(words.next().unwrap_or(""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lang_command_takes_the_next_word() {
        assert_eq!(language_command("/lang en"), Some("en"));
        assert_eq!(language_command("/lang   pt  "), Some("pt"));
        assert_eq!(language_command("/lang"), Some(""));
    }

    #[test]
    fn lang_command_needs_exact_keyword() {
        assert_eq!(language_command("/language en"), None);
        assert_eq!(language_command("/langen"), None);
        assert_eq!(language_command("what is /lang?"), None);
    }
}
