//! Provider retry wrapper: bounded retries with a per-attempt timeout.
//!
//! Wraps a single provider. Each attempt runs under `tokio::time::timeout`;
//! a failed attempt is retried only when the error is retryable
//! (see [`ProviderError::is_retryable`]).

use async_trait::async_trait;
use cvrag_core::error::ProviderError;
use cvrag_core::provider::*;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// A provider that retries its inner provider on transient failures.
pub struct RetryProvider {
    inner: Arc<dyn cvrag_core::Provider>,
    timeout: Duration,
    max_retries: u32,
    backoff: Duration,
}

impl RetryProvider {
    /// Wrap `inner` with the default timeout and retry count.
    pub fn new(inner: Arc<dyn cvrag_core::Provider>) -> Self {
        Self {
            inner,
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: Duration::from_millis(500),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Base delay between attempts; doubled after every failure.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Total attempts, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    async fn run<T, F, Fut>(&self, op: &str, mut call: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let provider_name = self.inner.name();
        let attempts = self.max_attempts();
        let mut delay = self.backoff;
        let mut attempt = 1;

        loop {
            let error = match tokio::time::timeout(self.timeout, call()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) => e,
                Err(_) => ProviderError::Timeout(format!(
                    "Provider '{}' timed out after {}ms",
                    provider_name,
                    self.timeout.as_millis()
                )),
            };

            if !error.is_retryable() || attempt >= attempts {
                warn!(
                    provider = %provider_name,
                    op,
                    attempt,
                    error = %error,
                    "Retry: giving up"
                );
                return Err(error);
            }

            let wait = match &error {
                ProviderError::RateLimited { retry_after_secs } => {
                    delay.max(Duration::from_secs(*retry_after_secs))
                }
                _ => delay,
            };

            info!(
                provider = %provider_name,
                op,
                attempt,
                total = attempts,
                error = %error,
                wait_ms = wait.as_millis() as u64,
                "Retry: attempt failed, retrying"
            );

            tokio::time::sleep(wait).await;
            delay = delay.saturating_mul(2);
            attempt += 1;
        }
    }
}

#[async_trait]
impl cvrag_core::Provider for RetryProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        self.run("complete", || self.inner.complete(request.clone()))
            .await
    }

    async fn embed(
        &self,
        request: EmbeddingRequest,
    ) -> std::result::Result<EmbeddingResponse, ProviderError> {
        self.run("embed", || self.inner.embed(request.clone())).await
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        match tokio::time::timeout(self.timeout, self.inner.health_check()).await {
            Ok(result) => result,
            Err(_) => Ok(false),
        }
    }
}
