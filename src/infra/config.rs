// src/infra/config.rs — Configuration loading (TOML + environment)

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::infra::errors::CalaiError;
use crate::infra::paths;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub estimation: EstimationConfig,

    #[serde(default)]
    pub reasoning: ReasoningConfig,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub nutrition: NutritionConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

/// Local volume-estimation microservice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimationConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for EstimationConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".into(),
            timeout_secs: 30,
        }
    }
}

impl EstimationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Hosted language-model API (OpenAI-compatible chat completions).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningConfig {
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Send the photo along with image-context questions.
    pub attach_image: bool,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            model: "gpt-4o".into(),
            api_key_env: "OPENAI_API_KEY".into(),
            timeout_secs: 60,
            max_tokens: 1000,
            temperature: 0.7,
            attach_image: true,
        }
    }
}

impl ReasoningConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Read the API key from the configured environment variable.
    /// A missing or blank key is a startup error, not a per-request one.
    pub fn api_key(&self) -> Result<String, CalaiError> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(CalaiError::Config(format!(
                "{} is not set. Export it or add it to a .env file.",
                self.api_key_env
            ))),
        }
    }
}

/// Backoff used for the single rate-limit retry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            initial_delay_ms: 2_000,
            max_delay_ms: 30_000,
        }
    }
}

/// Volume → mass → energy conversion constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NutritionConfig {
    pub density_g_per_ml: f64,
    pub kcal_per_gram: f64,
}

impl Default for NutritionConfig {
    fn default() -> Self {
        Self {
            density_g_per_ml: 1.0,
            kcal_per_gram: 1.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How many past turns are handed to the reasoning model.
    pub history_turns: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { history_turns: 10 }
    }
}

impl Config {
    /// Load config from the default location, falling back to defaults,
    /// then apply environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = match paths::config_file_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("CALAI_ESTIMATION_URL") {
            self.estimation.base_url = url;
        }
        if let Some(url) = lookup("CALAI_REASONING_URL") {
            self.reasoning.base_url = url;
        }
        if let Some(model) = lookup("CALAI_MODEL") {
            self.reasoning.model = model;
        }
    }

    /// Reject values that would make every request fail.
    pub fn validate(&self) -> Result<(), CalaiError> {
        if self.nutrition.density_g_per_ml <= 0.0 {
            return Err(CalaiError::Config(
                "nutrition.density_g_per_ml must be positive".into(),
            ));
        }
        if self.nutrition.kcal_per_gram <= 0.0 {
            return Err(CalaiError::Config(
                "nutrition.kcal_per_gram must be positive".into(),
            ));
        }
        if self.estimation.timeout_secs == 0 || self.reasoning.timeout_secs == 0 {
            return Err(CalaiError::Config("timeouts must be at least 1 second".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_reasonable() {
        let c = Config::default();
        assert_eq!(c.estimation.base_url, "http://localhost:5000");
        assert_eq!(c.estimation.timeout_secs, 30);
        assert_eq!(c.reasoning.model, "gpt-4o");
        assert_eq!(c.reasoning.api_key_env, "OPENAI_API_KEY");
        assert!(c.reasoning.timeout_secs > c.estimation.timeout_secs);
        assert!((c.nutrition.density_g_per_ml - 1.0).abs() < 1e-9);
        assert_eq!(c.session.history_turns, 10);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.retry.initial_delay_ms, 2_000);
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: Config = toml::from_str("[reasoning]\nmodel = \"gpt-4o-mini\"\n").unwrap();
        assert_eq!(config.reasoning.model, "gpt-4o-mini");
        assert_eq!(config.reasoning.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.reasoning.max_tokens, 1000);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[estimation]
base_url = "http://127.0.0.1:8080"
timeout_secs = 5

[reasoning]
base_url = "http://proxy.local/v1"
model = "gpt-4o-mini"
api_key_env = "MY_KEY"
timeout_secs = 20
max_tokens = 400
temperature = 0.2
attach_image = false

[retry]
initial_delay_ms = 100
max_delay_ms = 1000

[nutrition]
density_g_per_ml = 0.8
kcal_per_gram = 2.0

[session]
history_turns = 4
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.estimation.timeout(), Duration::from_secs(5));
        assert_eq!(config.reasoning.model, "gpt-4o-mini");
        assert!(!config.reasoning.attach_image);
        assert_eq!(config.retry.max_delay_ms, 1000);
        assert!((config.nutrition.kcal_per_gram - 2.0).abs() < 1e-9);
        assert_eq!(config.session.history_turns, 4);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("CALAI_ESTIMATION_URL", "http://gpu-box:5000"),
            ("CALAI_MODEL", "gpt-4.1"),
        ]
        .into_iter()
        .collect();
        let mut config = Config::default();
        config.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.estimation.base_url, "http://gpu-box:5000");
        assert_eq!(config.reasoning.model, "gpt-4.1");
        assert_eq!(config.reasoning.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let reasoning = ReasoningConfig {
            api_key_env: "CALAI_TEST_KEY_THAT_IS_NEVER_SET".into(),
            ..Default::default()
        };
        let err = reasoning.api_key().unwrap_err();
        assert!(matches!(err, CalaiError::Config(_)));
        assert!(err.to_string().contains("CALAI_TEST_KEY_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn test_validate_rejects_zero_density() {
        let mut config = Config::default();
        config.nutrition.density_g_per_ml = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_nonexistent_file() {
        assert!(Config::load_from(Path::new("/nonexistent/config.toml")).is_err());
    }
}
