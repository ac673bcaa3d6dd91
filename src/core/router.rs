// src/core/router.rs — Request router
//
// load session → resolve image → classify → dispatch → append turn → return.
// `handle` never fails: every outcome, including storage trouble, comes back
// as a TurnResult.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use super::classifier::classify;
use super::context::build_request;
use super::image::ImageRef;
use super::nutrition::CalorieConverter;
use super::types::{CalorieEstimate, Intent, Turn, TurnResult};
use crate::capability::deadline::{DeadlineEstimator, DeadlineReasoner};
use crate::capability::retry::{RetryConfig, RetryReasoner};
use crate::capability::{ReasoningClient, VolumeEstimator, NO_FOOD_DETECTED};
use crate::infra::config::{Config, NutritionConfig};
use crate::infra::errors::{CalaiError, ErrorKind};
use crate::session::store::SessionStore;
use crate::session::{Session, SessionId};

#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub estimation_timeout: Duration,
    pub reasoning_timeout: Duration,
    pub history_turns: usize,
    pub retry: RetryConfig,
    pub nutrition: NutritionConfig,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for RouterConfig {
    fn from(config: &Config) -> Self {
        Self {
            estimation_timeout: config.estimation.timeout(),
            reasoning_timeout: config.reasoning.timeout(),
            history_turns: config.session.history_turns,
            retry: RetryConfig::from(&config.retry),
            nutrition: config.nutrition.clone(),
        }
    }
}

pub struct Router {
    store: Arc<SessionStore>,
    estimator: Arc<dyn VolumeEstimator>,
    reasoner: Arc<dyn ReasoningClient>,
    converter: CalorieConverter,
    history_turns: usize,
}

impl Router {
    /// Wire the router to its collaborators. Both clients get a hard
    /// deadline; the reasoner additionally gets the rate-limit retry.
    pub fn new(
        store: Arc<SessionStore>,
        estimator: Arc<dyn VolumeEstimator>,
        reasoner: Arc<dyn ReasoningClient>,
        config: RouterConfig,
    ) -> Self {
        let estimator: Arc<dyn VolumeEstimator> =
            Arc::new(DeadlineEstimator::new(estimator, config.estimation_timeout));
        let reasoner: Arc<dyn ReasoningClient> = Arc::new(RetryReasoner::with_config(
            Arc::new(DeadlineReasoner::new(reasoner, config.reasoning_timeout)),
            config.retry,
        ));
        Self {
            store,
            estimator,
            reasoner,
            converter: CalorieConverter::new(&config.nutrition),
            history_turns: config.history_turns,
        }
    }

    /// Route one request and record it in the session.
    pub async fn handle(
        &self,
        session_id: &SessionId,
        query: Option<&str>,
        image_path: Option<&Path>,
    ) -> TurnResult {
        let session = self.store.load(session_id).await;
        let query = query.map(str::trim).filter(|q| !q.is_empty());

        let image = match image_path {
            Some(path) => match ImageRef::resolve(path).await {
                Ok(image) => Some(image),
                Err(e) => {
                    tracing::warn!(session = %session_id, "Rejected image: {}", e);
                    let raw = path.display().to_string();
                    let intent = classify(query, true);
                    return self.record(session_id, query, Some(raw.as_str()), intent, e.into()).await;
                }
            },
            None => None,
        };

        let intent = classify(query, image.is_some());
        tracing::info!(
            session = %session_id,
            intent = %intent,
            has_image = image.is_some(),
            prior_turns = session.len(),
            "Routing request"
        );

        let image_ref = image.as_ref().map(ImageRef::reference);
        let result = match (intent, image) {
            (Intent::EstimateOnly, Some(image)) => match self.estimate(&image).await {
                Ok(est) => TurnResult::CalorieEstimate(est),
                Err(e) => e.into(),
            },
            (Intent::GeneralQuestion, _) => {
                self.ask(&session, query.unwrap_or_default(), None, None)
                    .await
            }
            (Intent::ImageContextQuestion, Some(image)) => {
                self.image_question(&session, query.unwrap_or_default(), image)
                    .await
            }
            _ => {
                // Neither query nor image: terminal, and not recorded since a
                // turn without either would carry no request.
                tracing::info!(session = %session_id, "Empty request");
                return CalaiError::EmptyRequest.into();
            }
        };

        debug_assert!(result.consistent_with(intent));
        self.record(session_id, query, image_ref.as_deref(), intent, result)
            .await
    }

    /// Volume estimate → calories. Any estimator failure becomes
    /// `EstimationUnavailable`, except an image that turned unreadable.
    async fn estimate(&self, image: &ImageRef) -> Result<CalorieEstimate, CalaiError> {
        let volume = self.estimator.estimate(image).await.map_err(|e| {
            tracing::warn!(service = self.estimator.id(), "Estimation failed: {}", e);
            match e.kind() {
                Some(ErrorKind::InvalidImage) => e,
                _ => CalaiError::EstimationUnavailable {
                    message: e.to_string(),
                },
            }
        })?;
        if volume.is_empty() {
            tracing::warn!(service = self.estimator.id(), "Estimation found no food");
            return Err(CalaiError::EstimationUnavailable {
                message: NO_FOOD_DETECTED.into(),
            });
        }
        Ok(self.converter.convert(&volume))
    }

    async fn ask(
        &self,
        session: &Session,
        query: &str,
        estimate: Option<CalorieEstimate>,
        image: Option<ImageRef>,
    ) -> TurnResult {
        let request = build_request(session, self.history_turns, query, estimate.clone(), image);
        match self.reasoner.ask(request).await {
            Ok(text) => match estimate {
                Some(est) => TurnResult::answer_with_estimate(text, est),
                None => TurnResult::answer(text),
            },
            Err(e) => {
                tracing::warn!(service = self.reasoner.id(), "Reasoning failed: {}", e);
                e.into()
            }
        }
    }

    /// The estimate feeds the question, so it must finish first.
    async fn image_question(&self, session: &Session, query: &str, image: ImageRef) -> TurnResult {
        let estimate = match self.estimate(&image).await {
            Ok(est) => est,
            Err(e) => return e.into(),
        };
        self.ask(session, query, Some(estimate), Some(image)).await
    }

    async fn record(
        &self,
        session_id: &SessionId,
        query: Option<&str>,
        image: Option<&str>,
        intent: Intent,
        result: TurnResult,
    ) -> TurnResult {
        let Some(turn) = Turn::new(query, image, intent, result.clone()) else {
            return result;
        };
        match self.store.append(session_id, &turn).await {
            Ok(()) => result,
            Err(e) => {
                tracing::error!(session = %session_id, "Could not record turn: {}", e);
                e.into()
            }
        }
    }
}
