// src/core/types.rs — Core request/turn types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::infra::errors::{CalaiError, ErrorKind};

/// What a request needs from the capability clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    /// Image present, query empty or a bare calorie-calculation request.
    EstimateOnly,
    /// Query present, no image.
    GeneralQuestion,
    /// Query and image both present; the query is more than a calorie request.
    ImageContextQuestion,
    /// Neither query nor image.
    InvalidRequest,
}

impl Intent {
    pub fn needs_estimate(&self) -> bool {
        matches!(self, Intent::EstimateOnly | Intent::ImageContextQuestion)
    }

    pub fn needs_reasoning(&self) -> bool {
        matches!(self, Intent::GeneralQuestion | Intent::ImageContextQuestion)
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Intent::EstimateOnly => "EstimateOnly",
            Intent::GeneralQuestion => "GeneralQuestion",
            Intent::ImageContextQuestion => "ImageContextQuestion",
            Intent::InvalidRequest => "InvalidRequest",
        };
        f.write_str(s)
    }
}

/// Calories derived from an estimated food volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalorieEstimate {
    pub volume_ml: f64,
    pub mass_g: f64,
    pub calories_kcal: f64,
    /// Confidence reported by the estimation service, 0.0–1.0.
    pub confidence: Option<f32>,
    /// Caveats about the assumptions behind the number.
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnError {
    pub kind: ErrorKind,
    pub message: String,
}

/// Outcome of one routed request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnResult {
    CalorieEstimate(CalorieEstimate),
    Answer {
        text: String,
        /// Estimate the answer was grounded on, for image questions.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        estimate: Option<CalorieEstimate>,
    },
    Error(TurnError),
}

impl TurnResult {
    pub fn answer(text: impl Into<String>) -> Self {
        TurnResult::Answer {
            text: text.into(),
            estimate: None,
        }
    }

    pub fn answer_with_estimate(text: impl Into<String>, estimate: CalorieEstimate) -> Self {
        TurnResult::Answer {
            text: text.into(),
            estimate: Some(estimate),
        }
    }

    /// The calorie estimate carried by this result, if any.
    pub fn estimate(&self) -> Option<&CalorieEstimate> {
        match self {
            TurnResult::CalorieEstimate(est) => Some(est),
            TurnResult::Answer { estimate, .. } => estimate.as_ref(),
            TurnResult::Error(_) => None,
        }
    }

    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        TurnResult::Error(TurnError {
            kind,
            message: message.into(),
        })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, TurnResult::Error(_))
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            TurnResult::Error(e) => Some(e.kind),
            _ => None,
        }
    }

    /// Whether this result may have been produced by `intent`.
    pub fn consistent_with(&self, intent: Intent) -> bool {
        match self {
            TurnResult::CalorieEstimate(_) => intent == Intent::EstimateOnly,
            // Only a question about a photo carries that photo's estimate.
            TurnResult::Answer { estimate, .. } => {
                intent.needs_reasoning() && estimate.is_some() == intent.needs_estimate()
            }
            TurnResult::Error(_) => true,
        }
    }
}

impl From<CalaiError> for TurnResult {
    fn from(err: CalaiError) -> Self {
        // Errors without a taxonomy kind never come out of a capability
        // call; treat them as a service fault if they do.
        let kind = err.kind().unwrap_or(ErrorKind::ServiceError);
        TurnResult::error(kind, err.to_string())
    }
}

/// One request/response exchange within a session. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub intent: Intent,
    pub result: TurnResult,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Build a turn, normalising blank query/image to `None`. Returns
    /// `None` when neither is left, since such a turn carries no request.
    pub fn new(
        query: Option<&str>,
        image: Option<&str>,
        intent: Intent,
        result: TurnResult,
    ) -> Option<Self> {
        let query = query.filter(|q| !q.trim().is_empty()).map(str::to_string);
        let image = image.filter(|i| !i.trim().is_empty()).map(str::to_string);
        if query.is_none() && image.is_none() {
            return None;
        }
        Some(Self {
            id: uuid::Uuid::new_v4().to_string(),
            query,
            image,
            intent,
            result,
            timestamp: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_requires_query_or_image() {
        let r = TurnResult::answer("hi");
        assert!(Turn::new(None, None, Intent::GeneralQuestion, r.clone()).is_none());
        assert!(Turn::new(Some("   "), Some(""), Intent::GeneralQuestion, r.clone()).is_none());
        let t = Turn::new(Some("  what now?"), None, Intent::GeneralQuestion, r).unwrap();
        assert_eq!(t.query.as_deref(), Some("  what now?"));
        assert!(t.image.is_none());
    }

    #[test]
    fn test_result_consistency() {
        let est = TurnResult::CalorieEstimate(CalorieEstimate {
            volume_ml: 100.0,
            mass_g: 100.0,
            calories_kcal: 150.0,
            confidence: None,
            note: String::new(),
        });
        assert!(est.consistent_with(Intent::EstimateOnly));
        assert!(!est.consistent_with(Intent::ImageContextQuestion));
        assert!(!TurnResult::answer("x").consistent_with(Intent::EstimateOnly));
        assert!(TurnResult::answer("x").consistent_with(Intent::GeneralQuestion));
        assert!(!TurnResult::answer("x").consistent_with(Intent::ImageContextQuestion));
        assert!(TurnResult::error(ErrorKind::EmptyRequest, "e").consistent_with(Intent::InvalidRequest));
    }

    #[test]
    fn test_result_json_is_tagged() {
        let json = serde_json::to_value(TurnResult::answer("eat greens")).unwrap();
        assert_eq!(json["type"], "answer");
        assert_eq!(json["text"], "eat greens");
        assert!(json.get("estimate").is_none());

        let err = TurnResult::error(ErrorKind::InvalidImage, "missing");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["kind"], "InvalidImage");
    }

    #[test]
    fn test_from_calai_error() {
        let r: TurnResult = CalaiError::RateLimited {
            service: "openai".into(),
            retry_after_ms: 10,
        }
        .into();
        assert_eq!(r.error_kind(), Some(ErrorKind::RateLimited));
    }

    #[test]
    fn test_intent_capabilities() {
        assert!(Intent::ImageContextQuestion.needs_estimate());
        assert!(Intent::ImageContextQuestion.needs_reasoning());
        assert!(!Intent::GeneralQuestion.needs_estimate());
        assert!(!Intent::InvalidRequest.needs_reasoning());
    }
}
