// src/core/classifier.rs — Intent classification
//
// Literal matching only: a query is a calorie-calculation request when it
// is blank or normalises to one of CALCULATION_PHRASES.

use super::types::Intent;

/// Canonical phrasings of "just give me the calories".
pub const CALCULATION_PHRASES: &[&str] = &[
    "calculate calories",
    "calculate the calories",
    "calculate calorie",
    "count calories",
    "estimate calories",
    "how many calories",
    "how many calories is this",
    "how many calories are in this",
    "calories",
    "calorie count",
    "calculate nutrition",
];

/// Lowercase, collapse internal whitespace, drop trailing `.`, `!` and `?`.
pub fn normalize_query(query: &str) -> String {
    let collapsed = query.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_end_matches(['.', '!', '?'])
        .trim_end()
        .to_lowercase()
}

/// True for a blank query or one of the canonical calculation phrases.
/// Punctuation alone is not blank: `"?"` is a question, not a request.
pub fn is_calculation_request(query: &str) -> bool {
    if query.trim().is_empty() {
        return true;
    }
    let normalized = normalize_query(query);
    CALCULATION_PHRASES.contains(&normalized.as_str())
}

pub fn classify(query: Option<&str>, has_image: bool) -> Intent {
    let query = query.map(str::trim).filter(|q| !q.is_empty());
    match (query, has_image) {
        (None, false) => Intent::InvalidRequest,
        (None, true) => Intent::EstimateOnly,
        (Some(_), false) => Intent::GeneralQuestion,
        (Some(q), true) if is_calculation_request(q) => Intent::EstimateOnly,
        (Some(_), true) => Intent::ImageContextQuestion,
    }
}
