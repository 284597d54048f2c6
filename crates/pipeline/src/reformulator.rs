//! Query reformulation: turns a follow-up into a standalone question.

use cvrag_core::error::ProviderError;
use cvrag_core::language::Language;
use cvrag_core::message::Message;
use cvrag_core::provider::{Provider, ProviderRequest};
use std::sync::Arc;
use tracing::debug;

/// Rewrites a question so it can be understood without the conversation.
///
/// Prompt layout: the language's reformulation instruction as a system
/// message, then the history, then `Question: {question}` as a user message.
pub struct QueryReformulator {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl QueryReformulator {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// The messages sent to the model.
    pub fn build_messages(question: &str, history: &[Message], language: Language) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system(language.pack().reformulation_template));
        messages.extend(history.iter().cloned());
        messages.push(Message::user(format!("Question: {question}")));
        messages
    }

    /// Reformulate `question` given `history`.
    ///
    /// A blank model reply falls back to the original question.
    pub async fn reformulate(
        &self,
        question: &str,
        history: &[Message],
        language: Language,
    ) -> Result<String, ProviderError> {
        let request = ProviderRequest::new(
            &self.model,
            Self::build_messages(question, history, language),
        )
        .with_temperature(self.temperature)
        .with_max_tokens(self.max_tokens);

        let response = self.provider.complete(request).await?;
        let reformulated = response.message.content.trim();

        debug!(history = history.len(), reformulated, "Question reformulated");

        if reformulated.is_empty() {
            Ok(question.to_string())
        } else {
            Ok(reformulated.to_string())
        }
    }
}
