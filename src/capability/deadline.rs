// src/capability/deadline.rs — Hard deadlines around capability calls
//
// The HTTP clients carry their own request timeouts, but any implementation
// plugged into the router gets wrapped here too, so no remote call can block
// a request indefinitely. An expired deadline is reported as NetworkFailure.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{ReasoningClient, ReasoningRequest, VolumeEstimate, VolumeEstimator};
use crate::core::image::ImageRef;
use crate::infra::errors::CalaiError;

fn expired(service: &str, limit: Duration) -> CalaiError {
    CalaiError::NetworkFailure {
        service: service.to_string(),
        message: format!("no response within {:.1}s", limit.as_secs_f64()),
    }
}

pub struct DeadlineEstimator {
    inner: Arc<dyn VolumeEstimator>,
    limit: Duration,
}

impl DeadlineEstimator {
    pub fn new(inner: Arc<dyn VolumeEstimator>, limit: Duration) -> Self {
        Self { inner, limit }
    }
}

#[async_trait]
impl VolumeEstimator for DeadlineEstimator {
    fn id(&self) -> &str {
        self.inner.id()
    }

    async fn estimate(&self, image: &ImageRef) -> Result<VolumeEstimate, CalaiError> {
        tokio::time::timeout(self.limit, self.inner.estimate(image))
            .await
            .unwrap_or_else(|_| Err(expired(self.inner.id(), self.limit)))
    }

    async fn health(&self) -> Result<(), CalaiError> {
        tokio::time::timeout(self.limit, self.inner.health())
            .await
            .unwrap_or_else(|_| Err(expired(self.inner.id(), self.limit)))
    }
}

pub struct DeadlineReasoner {
    inner: Arc<dyn ReasoningClient>,
    limit: Duration,
}

impl DeadlineReasoner {
    pub fn new(inner: Arc<dyn ReasoningClient>, limit: Duration) -> Self {
        Self { inner, limit }
    }
}

#[async_trait]
impl ReasoningClient for DeadlineReasoner {
    fn id(&self) -> &str {
        self.inner.id()
    }

    async fn ask(&self, request: ReasoningRequest) -> Result<String, CalaiError> {
        tokio::time::timeout(self.limit, self.inner.ask(request))
            .await
            .unwrap_or_else(|_| Err(expired(self.inner.id(), self.limit)))
    }
}
