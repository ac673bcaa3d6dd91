// src/capability/mod.rs — External capability clients

pub mod deadline;
pub mod openai;
pub mod retry;
pub mod volume;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::image::ImageRef;
use crate::core::types::CalorieEstimate;
use crate::infra::errors::CalaiError;

/// Message used when a photo yields no measurable food.
pub const NO_FOOD_DETECTED: &str = "no food detected";

/// Food volume estimated from a single photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeEstimate {
    pub volume_ml: f64,
    pub confidence: Option<f32>,
    pub segments: usize,
}

impl VolumeEstimate {
    /// Nothing was segmented, or the segments add up to no volume.
    pub fn is_empty(&self) -> bool {
        self.segments == 0 || self.volume_ml <= 0.0
    }
}

/// Vision-based volume estimation (a local microservice in production).
#[async_trait]
pub trait VolumeEstimator: Send + Sync {
    /// Short name used in logs and error messages.
    fn id(&self) -> &str;

    /// Estimate the food volume in the image. Implementations must bound
    /// their own I/O; errors are `NetworkFailure` or `Service`.
    async fn estimate(&self, image: &ImageRef) -> Result<VolumeEstimate, CalaiError>;

    /// Cheap reachability check.
    async fn health(&self) -> Result<(), CalaiError>;
}

/// One past request/response pair handed to the model for continuity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub user: String,
    pub assistant: String,
}

/// A calorie estimate recorded earlier in the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PastEstimate {
    pub when: String,
    pub image: Option<String>,
    pub calories_kcal: f64,
    pub volume_ml: f64,
}

/// Everything the reasoning model sees for one question.
#[derive(Debug, Clone, Default)]
pub struct ReasoningRequest {
    pub query: String,
    /// Oldest first.
    pub history: Vec<Exchange>,
    pub past_estimates: Vec<PastEstimate>,
    /// Estimate for the image attached to this very request.
    pub estimate: Option<CalorieEstimate>,
    pub image: Option<ImageRef>,
}

/// Hosted language model answering food and nutrition questions.
#[async_trait]
pub trait ReasoningClient: Send + Sync {
    fn id(&self) -> &str {
        "reasoning"
    }

    /// Errors are `NetworkFailure`, `RateLimited` or `Service`.
    async fn ask(&self, request: ReasoningRequest) -> Result<String, CalaiError>;
}

/// Map a reqwest transport error onto the capability taxonomy.
pub(crate) fn transport_error(service: &str, err: reqwest::Error) -> CalaiError {
    let message = if err.is_timeout() {
        format!("request timed out: {err}")
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    };
    CalaiError::NetworkFailure {
        service: service.to_string(),
        message,
    }
}
