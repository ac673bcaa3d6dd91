// src/cli/ask.rs — Default command: route one request

use std::path::Path;
use std::sync::Arc;

use crate::capability::openai::OpenAIReasoner;
use crate::capability::volume::HttpVolumeEstimator;
use crate::core::router::{Router, RouterConfig};
use crate::core::types::{CalorieEstimate, TurnResult};
use crate::infra::config::Config;
use crate::session::store::SessionStore;
use crate::session::SessionId;

/// Build the router from config, route the request, print the result.
/// Returns `false` when the result is an error.
pub async fn run_ask(
    session_path: &Path,
    query: &str,
    image: Option<&Path>,
    config: &Config,
    json: bool,
) -> anyhow::Result<bool> {
    let (root, session_id) = SessionId::from_path(session_path)?;

    // Both clients are built up front so a missing API key fails at startup.
    let estimator = Arc::new(HttpVolumeEstimator::new(&config.estimation)?);
    let reasoner = Arc::new(OpenAIReasoner::from_config(&config.reasoning)?);
    let store = Arc::new(SessionStore::new(root));

    let router = Router::new(store, estimator, reasoner, RouterConfig::from(config));
    let result = router.handle(&session_id, Some(query), image).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if result.is_error() {
        eprintln!("{}", render_result(&result));
    } else {
        println!("{}", render_result(&result));
    }

    Ok(!result.is_error())
}

/// Human-readable rendering of a result.
pub fn render_result(result: &TurnResult) -> String {
    match result {
        TurnResult::CalorieEstimate(est) => render_estimate(est),
        TurnResult::Answer { text, estimate } => match estimate {
            Some(est) => format!(
                "{}\n\n(based on an estimate of ~{:.0} kcal from {:.0} ml)",
                text, est.calories_kcal, est.volume_ml
            ),
            None => text.clone(),
        },
        TurnResult::Error(e) => format!("error [{}]: {}", e.kind, e.message),
    }
}

fn render_estimate(est: &CalorieEstimate) -> String {
    format!(
        "Estimated calories: ~{:.0} kcal\n  Volume: {:.1} ml\n  Mass:   {:.1} g\n  Note:   {}",
        est.calories_kcal, est.volume_ml, est.mass_g, est.note
    )
}
