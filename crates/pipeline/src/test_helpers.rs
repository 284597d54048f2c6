//! Shared test helpers for pipeline tests.

use async_trait::async_trait;
use cvrag_core::error::{ProviderError, RetrievalError};
use cvrag_core::message::Message;
use cvrag_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use cvrag_core::retrieval::{RetrievedFragment, Retriever};
use std::collections::VecDeque;
use std::sync::Mutex;

/// A mock provider that replays scripted outcomes and records every request.
///
/// Panics if more calls are made than outcomes provided.
pub struct ScriptedProvider {
    outcomes: Mutex<VecDeque<Result<String, ProviderError>>>,
    always_fail: Option<ProviderError>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    /// Succeed with each text in turn.
    pub fn new<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_outcomes(texts.into_iter().map(|t| Ok(t.into())).collect())
    }

    pub fn from_outcomes(outcomes: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            always_fail: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fail every call with `error`.
    pub fn failing(error: ProviderError) -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            always_fail: Some(error),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn request(&self, index: usize) -> ProviderRequest {
        self.requests.lock().unwrap()[index].clone()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len()
        };

        if let Some(error) = &self.always_fail {
            return Err(error.clone());
        }

        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("ScriptedProvider: no more outcomes (call #{call})"));

        outcome.map(|text| make_text_response(&text))
    }
}

pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// Returns the same fragments for every query and counts calls.
pub struct FixedRetriever {
    texts: Vec<String>,
    queries: Mutex<Vec<String>>,
}

impl FixedRetriever {
    pub fn new<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            texts: texts.into_iter().map(Into::into).collect(),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::<String>::new())
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Retriever for FixedRetriever {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedFragment>, RetrievalError> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self
            .texts
            .iter()
            .enumerate()
            .map(|(rank, text)| RetrievedFragment::new(text.clone(), rank))
            .collect())
    }
}

/// Always fails.
pub struct FailingRetriever;

#[async_trait]
impl Retriever for FailingRetriever {
    fn name(&self) -> &str {
        "failing"
    }

    async fn retrieve(&self, _query: &str) -> Result<Vec<RetrievedFragment>, RetrievalError> {
        Err(RetrievalError::SearchFailed("index unavailable".into()))
    }
}
