// src/core/context.rs — Conversation context for reasoning calls

use crate::capability::{Exchange, PastEstimate, ReasoningRequest};
use crate::core::image::ImageRef;
use crate::core::types::{CalorieEstimate, Turn, TurnResult};
use crate::session::Session;

/// Assemble the reasoning request for `query` from the session so far.
///
/// `history_turns` bounds how many recent successful exchanges are
/// replayed; every earlier calorie estimate is summarised regardless.
pub fn build_request(
    session: &Session,
    history_turns: usize,
    query: &str,
    estimate: Option<CalorieEstimate>,
    image: Option<ImageRef>,
) -> ReasoningRequest {
    let history = session
        .turns
        .iter()
        .filter_map(exchange_for)
        .collect::<Vec<_>>();
    let skip = history.len().saturating_sub(history_turns);

    let past_estimates = session
        .turns
        .iter()
        .filter_map(|t| {
            t.result.estimate().map(|est| PastEstimate {
                when: t.timestamp.format("%Y-%m-%d %H:%M").to_string(),
                image: t.image.as_deref().map(display_name),
                calories_kcal: est.calories_kcal,
                volume_ml: est.volume_ml,
            })
        })
        .collect();

    ReasoningRequest {
        query: query.trim().to_string(),
        history: history.into_iter().skip(skip).collect(),
        past_estimates,
        estimate,
        image,
    }
}

fn exchange_for(turn: &Turn) -> Option<Exchange> {
    let user = match (&turn.query, &turn.image) {
        (Some(q), Some(img)) => format!("{q} [photo: {}]", display_name(img)),
        (Some(q), None) => q.clone(),
        (None, Some(img)) => format!("[photo: {}] Calculate calories", display_name(img)),
        (None, None) => return None,
    };
    let assistant = match &turn.result {
        TurnResult::Answer { text, .. } => text.clone(),
        TurnResult::CalorieEstimate(est) => format!(
            "Estimated ~{:.0} kcal from about {:.0} ml of food.",
            est.calories_kcal, est.volume_ml
        ),
        TurnResult::Error(_) => return None,
    };
    Some(Exchange { user, assistant })
}

/// File name part of a stored image reference.
fn display_name(reference: &str) -> String {
    std::path::Path::new(reference)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| reference.to_string())
}
