// src/capability/volume.rs — HTTP client for the volume-estimation service
//
// POST {base}/estimate-volume  multipart, field "image"
// GET  {base}/health
//
// The service reports `total_volume` in litres.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::{transport_error, VolumeEstimate, VolumeEstimator, NO_FOOD_DETECTED};
use crate::core::image::ImageRef;
use crate::infra::config::EstimationConfig;
use crate::infra::errors::CalaiError;

const SERVICE: &str = "volume-estimator";

pub struct HttpVolumeEstimator {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct EstimateResponse {
    #[serde(default)]
    success: bool,
    total_volume: Option<f64>,
    num_segments: Option<usize>,
    #[serde(default)]
    segments: Vec<serde_json::Value>,
    confidence: Option<f32>,
    error: Option<String>,
}

impl HttpVolumeEstimator {
    pub fn new(config: &EstimationConfig) -> Result<Self, CalaiError> {
        Self::with_timeout(config.base_url.clone(), config.timeout())
    }

    pub fn with_timeout(base_url: String, timeout: Duration) -> Result<Self, CalaiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .build()
            .map_err(|e| CalaiError::Config(format!("Cannot build HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl VolumeEstimator for HttpVolumeEstimator {
    fn id(&self) -> &str {
        SERVICE
    }

    async fn estimate(&self, image: &ImageRef) -> Result<VolumeEstimate, CalaiError> {
        let bytes = image.read_bytes().await?;
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(image.file_name().to_string())
            .mime_str(image.mime())
            .map_err(|e| transport_error(SERVICE, e))?;
        let form = reqwest::multipart::Form::new().part("image", part);

        let response = self
            .client
            .post(format!("{}/estimate-volume", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        let parsed: Option<EstimateResponse> = serde_json::from_str(&body).ok();

        if !status.is_success() {
            let detail = parsed
                .and_then(|p| p.error)
                .unwrap_or_else(|| crate::util::truncate_chars(&body, 200));
            return Err(CalaiError::Service {
                service: SERVICE.into(),
                message: format!("HTTP {status}: {detail}"),
            });
        }

        let parsed = parsed.ok_or_else(|| CalaiError::Service {
            service: SERVICE.into(),
            message: "response is not valid JSON".into(),
        })?;

        if !parsed.success {
            return Err(CalaiError::Service {
                service: SERVICE.into(),
                message: parsed
                    .error
                    .unwrap_or_else(|| "estimation reported failure".into()),
            });
        }

        let litres = parsed.total_volume.ok_or_else(|| CalaiError::Service {
            service: SERVICE.into(),
            message: "response has no total_volume".into(),
        })?;
        if !litres.is_finite() || litres < 0.0 {
            return Err(CalaiError::Service {
                service: SERVICE.into(),
                message: format!("implausible total_volume {litres}"),
            });
        }

        let estimate = VolumeEstimate {
            volume_ml: litres * 1000.0,
            confidence: parsed.confidence,
            segments: parsed.num_segments.unwrap_or(parsed.segments.len()),
        };
        // The service answers success with a zero total when it segments nothing.
        if estimate.is_empty() {
            return Err(CalaiError::Service {
                service: SERVICE.into(),
                message: NO_FOOD_DETECTED.into(),
            });
        }
        tracing::debug!(
            volume_ml = estimate.volume_ml,
            segments = estimate.segments,
            "Volume estimate received"
        );
        Ok(estimate)
    }

    async fn health(&self) -> Result<(), CalaiError> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .timeout(Duration::from_secs(3))
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(CalaiError::Service {
                service: SERVICE.into(),
                message: format!("health check returned HTTP {}", response.status()),
            })
        }
    }
}
