//! Chat session: one conversation's history bound to the shared pipeline.

use crate::pipeline::{PipelineError, RagPipeline, RagResult};
use cvrag_core::language::Language;
use cvrag_core::message::{ConversationState, Message};
use serde::Serialize;
use tracing::{error, warn};

/// How a question was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyKind {
    /// The pipeline produced an answer (including the fallback answer).
    Answered,
    /// The question was refused before any work was done.
    Rejected,
    /// The request failed; the text is the generic error message.
    Failed,
}

/// What the user sees for one question.
#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub kind: ReplyKind,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<RagResult>,
}

/// Owns one conversation. Not shared between users.
pub struct ChatSession {
    state: ConversationState,
    language: Language,
}

impl ChatSession {
    /// Start a conversation seeded with the language's welcome message.
    pub fn new(language: Language, history_limit: usize) -> Self {
        Self {
            state: ConversationState::with_welcome(history_limit, language),
            language,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Switch the language for subsequent questions. History is kept.
    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    pub fn history(&self) -> &[Message] {
        self.state.messages()
    }

    /// Ask one question.
    ///
    /// Rejected questions leave the history untouched. The assistant reply
    /// is recorded only when the pipeline succeeds.
    pub async fn ask(&mut self, pipeline: &RagPipeline, question: &str) -> Reply {
        if let Err(rejection) = pipeline.validate_question(question) {
            warn!(reason = %rejection, "Question rejected");
            return Reply {
                kind: ReplyKind::Rejected,
                text: rejection.user_message(self.language),
                result: None,
            };
        }

        self.state.append(Message::user(question));
        let history = self.state.snapshot();

        match pipeline.answer(question, &history, self.language).await {
            Ok(result) => {
                self.state.append(Message::assistant(&result.answer));
                Reply {
                    kind: ReplyKind::Answered,
                    text: result.answer.clone(),
                    result: Some(result),
                }
            }
            Err(PipelineError::InputRejected(rejection)) => Reply {
                kind: ReplyKind::Rejected,
                text: rejection.user_message(self.language),
                result: None,
            },
            Err(e) => {
                error!(error = %e, "Request failed");
                Reply {
                    kind: ReplyKind::Failed,
                    text: e.user_message(self.language),
                    result: None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{FixedRetriever, ScriptedProvider};
    use cvrag_core::error::ProviderError;
    use cvrag_core::message::Role;
    use std::sync::Arc;

    fn rag(provider: Arc<ScriptedProvider>, texts: &[&str]) -> RagPipeline {
        RagPipeline::new(provider, Arc::new(FixedRetriever::new(texts.to_vec())), "m")
    }

    #[test]
    fn starts_with_welcome() {
        let session = ChatSession::new(Language::En, 20);
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history()[0].role, Role::Assistant);
        assert_eq!(session.history()[0].content, Language::En.pack().welcome_message);
    }

    #[tokio::test]
    async fn answered_turn_records_both_messages() {
        let provider = Arc::new(ScriptedProvider::new(["standalone", "I have 5 years in AI."]));
        let pipeline = rag(provider.clone(), &["Thiago has 5 years of experience in AI"]);
        let mut session = ChatSession::new(Language::En, 20);

        let reply = session.ask(&pipeline, "What is his experience?").await;

        assert_eq!(reply.kind, ReplyKind::Answered);
        assert_eq!(reply.text, "I have 5 years in AI.");
        assert!(reply.result.unwrap().had_context);

        let history = session.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[1].content, "What is his experience?");
        assert_eq!(history[2].content, "I have 5 years in AI.");

        // The reformulation prompt already contains the new user turn.
        let reformulation = provider.request(0);
        assert_eq!(reformulation.messages.len(), 1 + 2 + 1);
    }

    #[tokio::test]
    async fn fallback_answer_is_recorded() {
        let provider = Arc::new(ScriptedProvider::new(["standalone"]));
        let pipeline = rag(provider, &[]);
        let mut session = ChatSession::new(Language::Pt, 20);

        let reply = session.ask(&pipeline, "Qual o salário?").await;

        assert_eq!(reply.kind, ReplyKind::Answered);
        assert_eq!(reply.text, Language::Pt.pack().fallback_message);
        assert_eq!(session.history().len(), 3);
    }

    #[tokio::test]
    async fn rejected_question_leaves_history_untouched() {
        let provider = Arc::new(ScriptedProvider::new(Vec::<String>::new()));
        let pipeline = rag(provider.clone(), &["unused"]);
        let mut session = ChatSession::new(Language::Pt, 20);

        let reply = session.ask(&pipeline, "   ").await;
        assert_eq!(reply.kind, ReplyKind::Rejected);
        assert_eq!(reply.text, "Por favor, digite uma pergunta.");

        let reply = session.ask(&pipeline, &"x".repeat(5001)).await;
        assert_eq!(reply.kind, ReplyKind::Rejected);
        assert!(reply.text.contains("5000"));

        assert_eq!(session.history().len(), 1);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn failure_returns_generic_message_without_assistant_turn() {
        let provider = Arc::new(ScriptedProvider::failing(ProviderError::Network("down".into())));
        let pipeline = rag(provider, &["fragment"]);
        let mut session = ChatSession::new(Language::En, 20);

        let reply = session.ask(&pipeline, "Hello?").await;

        assert_eq!(reply.kind, ReplyKind::Failed);
        assert_eq!(reply.text, Language::En.pack().error_message);
        assert!(reply.result.is_none());

        let history = session.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].role, Role::User);
    }

    #[tokio::test]
    async fn history_stays_bounded_over_many_turns() {
        let script: Vec<String> = (0..60).map(|i| format!("reply {i}")).collect();
        let provider = Arc::new(ScriptedProvider::new(script));
        let pipeline = rag(provider.clone(), &["fragment"]);
        let mut session = ChatSession::new(Language::En, 20);

        for i in 0..30 {
            session.ask(&pipeline, &format!("question {i}")).await;
            assert!(session.history().len() <= 20);
        }

        assert_eq!(session.history().len(), 20);
        assert_eq!(session.history().last().unwrap().content, "reply 59");
        for request in provider.requests().iter().step_by(2) {
            // system + at most 20 history messages + question
            assert!(request.messages.len() <= 22);
        }
    }

    #[tokio::test]
    async fn language_switch_applies_to_next_question() {
        let provider = Arc::new(ScriptedProvider::new(["q"]));
        let pipeline = rag(provider, &[]);
        let mut session = ChatSession::new(Language::Pt, 20);

        session.set_language(Language::En);
        let reply = session.ask(&pipeline, "Salary?").await;
        assert_eq!(reply.text, Language::En.pack().fallback_message);
        assert_eq!(session.language(), Language::En);
    }
}
