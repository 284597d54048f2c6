//! Answer generation grounded in an assembled context.

use cvrag_core::error::ProviderError;
use cvrag_core::language::Language;
use cvrag_core::message::Message;
use cvrag_core::provider::{Provider, ProviderRequest};
use std::sync::Arc;
use tracing::info;

/// Fills the language's answer template and asks the model once.
pub struct AnswerGenerator {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl AnswerGenerator {
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

    /// Substitute `{context}` and `{input}` into the answer template.
    ///
    /// Substituted values are never rescanned, so a question containing
    /// `{context}` stays literal.
    pub fn render_prompt(question: &str, context: &str, language: Language) -> String {
        language
            .pack()
            .answer_template
            .split("{context}")
            .map(|part| part.replace("{input}", question))
            .collect::<Vec<_>>()
            .join(context)
    }

    /// Generate an answer to `question` from `context`.
    pub async fn generate(
        &self,
        question: &str,
        context: &str,
        language: Language,
    ) -> Result<String, ProviderError> {
        let prompt = Self::render_prompt(question, context, language);

        let request = ProviderRequest::new(&self.model, vec![Message::system(prompt)])
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        let response = self.provider.complete(request).await?;
        let answer = response.message.content.trim().to_string();

        info!(
            model = %response.model,
            answer_len = answer.len(),
            context_len = context.chars().count(),
            "Answer generated"
        );

        Ok(answer)
    }
}
