// src/capability/retry.rs — Single rate-limit retry for reasoning clients
//
// Wraps any ReasoningClient. Only RateLimited is retried, and only once;
// every other error is returned as-is.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{ReasoningClient, ReasoningRequest};
use crate::infra::config::RetrySettings;
use crate::infra::errors::CalaiError;

const MAX_RETRIES: u32 = 1;
const RETRY_AFTER_BUFFER_MS: u64 = 100;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryConfig {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_retries: MAX_RETRIES,
            initial_delay: Duration::from_millis(settings.initial_delay_ms),
            max_delay: Duration::from_millis(settings.max_delay_ms),
        }
    }
}

pub struct RetryReasoner {
    inner: Arc<dyn ReasoningClient>,
    config: RetryConfig,
}

impl RetryReasoner {
    pub fn with_config(inner: Arc<dyn ReasoningClient>, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    /// Delay before retry `attempt` (0-indexed). A server hint wins over
    /// exponential backoff; both are capped at `max_delay`.
    fn delay_for_attempt(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        let delay = match hint {
            Some(h) => h + Duration::from_millis(RETRY_AFTER_BUFFER_MS),
            None => self.config.initial_delay.saturating_mul(2u32.saturating_pow(attempt)),
        };
        delay.min(self.config.max_delay)
    }
}

fn rate_limit_hint(error: &CalaiError) -> Option<Duration> {
    match error {
        CalaiError::RateLimited { retry_after_ms, .. } if *retry_after_ms > 0 => {
            Some(Duration::from_millis(*retry_after_ms))
        }
        _ => None,
    }
}

#[async_trait]
impl ReasoningClient for RetryReasoner {
    fn id(&self) -> &str {
        self.inner.id()
    }

    async fn ask(&self, request: ReasoningRequest) -> Result<String, CalaiError> {
        let mut attempt = 0;
        loop {
            match self.inner.ask(request.clone()).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retriable() && attempt < self.config.max_retries => {
                    let delay = self.delay_for_attempt(attempt, rate_limit_hint(&e));
                    tracing::warn!(
                        service = self.inner.id(),
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying after error: {}",
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
