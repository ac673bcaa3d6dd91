// src/cli/history.rs — Print a session's recorded turns

use std::path::Path;

use crate::core::types::{Turn, TurnResult};
use crate::session::store::SessionStore;
use crate::session::SessionId;
use crate::util::truncate_chars;

pub async fn show_history(session_path: &Path, limit: Option<usize>, json: bool) -> anyhow::Result<()> {
    let (root, session_id) = SessionId::from_path(session_path)?;
    let store = SessionStore::new(root);
    let session = store.load(&session_id).await;

    let turns = match limit {
        Some(n) => session.recent(n),
        None => &session.turns[..],
    };

    if json {
        for turn in turns {
            println!("{}", serde_json::to_string(turn)?);
        }
        return Ok(());
    }

    if session.is_empty() {
        println!("Session '{}' has no turns yet.", session_id);
        return Ok(());
    }

    println!(
        "Session '{}': {} turn(s), {} estimate(s), {} error(s)",
        session_id,
        session.len(),
        session.estimates().count(),
        session.errors()
    );
    for turn in turns {
        println!();
        println!("{}", format_turn(turn));
    }
    Ok(())
}

fn format_turn(turn: &Turn) -> String {
    let mut out = format!(
        "[{}] {}",
        turn.timestamp.format("%Y-%m-%d %H:%M:%S"),
        turn.intent
    );
    if let Some(image) = &turn.image {
        out.push_str(&format!("  ({image})"));
    }
    if let Some(query) = &turn.query {
        out.push_str(&format!("\n  > {query}"));
    }
    let summary = match &turn.result {
        TurnResult::CalorieEstimate(est) => {
            format!("~{:.0} kcal from {:.0} ml", est.calories_kcal, est.volume_ml)
        }
        TurnResult::Answer { text, .. } => truncate_chars(&text.replace('\n', " "), 160),
        TurnResult::Error(e) => format!("error [{}]: {}", e.kind, e.message),
    };
    out.push_str(&format!("\n  < {summary}"));
    out
}
