// src/cli/health.rs — Reachability check for the capability backends

use crate::capability::volume::HttpVolumeEstimator;
use crate::capability::VolumeEstimator;
use crate::infra::config::Config;

/// Probe the estimation service and check the reasoning key is present.
/// Returns `false` if either is missing.
pub async fn check_health(config: &Config, json: bool) -> anyhow::Result<bool> {
    let estimator = HttpVolumeEstimator::new(&config.estimation)?;
    let estimation = estimator.health().await;
    let key = config.reasoning.api_key();

    if json {
        let report = serde_json::json!({
            "estimation": {
                "url": config.estimation.base_url,
                "reachable": estimation.is_ok(),
                "error": estimation.as_ref().err().map(|e| e.to_string()),
            },
            "reasoning": {
                "url": config.reasoning.base_url,
                "model": config.reasoning.model,
                "api_key_present": key.is_ok(),
            },
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        match &estimation {
            Ok(()) => println!("  Estimation: {} (reachable)", config.estimation.base_url),
            Err(e) => println!("  Estimation: {} (unreachable: {e})", config.estimation.base_url),
        }
        match &key {
            Ok(_) => println!(
                "  Reasoning:  {} via {} ({} set)",
                config.reasoning.model, config.reasoning.base_url, config.reasoning.api_key_env
            ),
            Err(e) => println!("  Reasoning:  {e}"),
        }
    }

    Ok(estimation.is_ok() && key.is_ok())
}
