// src/capability/openai.rs — OpenAI-compatible chat completions client

use async_trait::async_trait;
use base64::Engine;
use std::time::Duration;

use super::{transport_error, ReasoningClient, ReasoningRequest};
use crate::infra::config::ReasoningConfig;
use crate::infra::errors::CalaiError;
use crate::util::truncate_chars;

const SERVICE: &str = "openai";

/// Characters of each past message kept in the prompt.
const HISTORY_SNIPPET_CHARS: usize = 600;

pub struct OpenAIReasoner {
    api_key: String,
    client: reqwest::Client,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    attach_image: bool,
}

impl OpenAIReasoner {
    /// Build from config. Fails when the API key variable is unset.
    pub fn from_config(config: &ReasoningConfig) -> Result<Self, CalaiError> {
        let api_key = config.api_key()?;
        Self::new(api_key, config)
    }

    pub fn new(api_key: String, config: &ReasoningConfig) -> Result<Self, CalaiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| CalaiError::Config(format!("Cannot build HTTP client: {e}")))?;
        Ok(Self {
            api_key,
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            attach_image: config.attach_image,
        })
    }

    async fn build_messages(
        &self,
        request: &ReasoningRequest,
    ) -> Result<Vec<serde_json::Value>, CalaiError> {
        let mut msgs = vec![serde_json::json!({
            "role": "system",
            "content": system_prompt(request),
        })];

        for ex in &request.history {
            msgs.push(serde_json::json!({
                "role": "user",
                "content": truncate_chars(&ex.user, HISTORY_SNIPPET_CHARS),
            }));
            msgs.push(serde_json::json!({
                "role": "assistant",
                "content": truncate_chars(&ex.assistant, HISTORY_SNIPPET_CHARS),
            }));
        }

        let text = user_text(request);
        let image = match &request.image {
            Some(image) if self.attach_image => Some(image),
            _ => None,
        };
        let content = match image {
            Some(image) => {
                let encoded = base64::engine::general_purpose::STANDARD
                    .encode(image.read_bytes().await?);
                serde_json::json!([
                    { "type": "text", "text": text },
                    {
                        "type": "image_url",
                        "image_url": { "url": format!("data:{};base64,{}", image.mime(), encoded) }
                    }
                ])
            }
            None => serde_json::json!(text),
        };
        msgs.push(serde_json::json!({ "role": "user", "content": content }));
        Ok(msgs)
    }
}

/// System prompt: role, rules, and what the session already knows.
pub fn system_prompt(request: &ReasoningRequest) -> String {
    let mut prompt = String::from(
        "You are a food and nutrition assistant. You answer general food and \
         nutrition questions, give meal recommendations, compare meals, and \
         interpret calorie estimates computed from photos.\n\
         Rules:\n\
         - When a calorie estimate is provided, use it and say it is approximate.\n\
         - When asked about past meals, use the earlier estimates listed below.\n\
         - If you do not have specific data, say so plainly.\n\
         - Be concise and conversational.\n",
    );

    if request.past_estimates.is_empty() {
        prompt.push_str("\nNo earlier calorie estimates in this session.");
    } else {
        prompt.push_str("\nEarlier calorie estimates in this session:\n");
        for (i, past) in request.past_estimates.iter().enumerate() {
            let image = past.image.as_deref().unwrap_or("photo");
            prompt.push_str(&format!(
                "{}. [{}] {}: ~{:.0} kcal ({:.0} ml)\n",
                i + 1,
                past.when,
                image,
                past.calories_kcal,
                past.volume_ml
            ));
        }
    }
    prompt
}

/// The current user turn, with the fresh estimate spliced in as context.
pub fn user_text(request: &ReasoningRequest) -> String {
    match &request.estimate {
        Some(est) => format!(
            "{}\n\n[Calorie estimate for the attached photo: ~{:.0} kcal from {:.0} ml (~{:.0} g). {}]",
            request.query, est.calories_kcal, est.volume_ml, est.mass_g, est.note
        ),
        None => request.query.clone(),
    }
}

/// Parse a Retry-After header given in seconds.
fn retry_after_ms(headers: &reqwest::header::HeaderMap) -> u64 {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<f64>().ok())
        .map(|secs| (secs * 1000.0) as u64)
        .unwrap_or(0)
}

#[async_trait]
impl ReasoningClient for OpenAIReasoner {
    fn id(&self) -> &str {
        SERVICE
    }

    async fn ask(&self, request: ReasoningRequest) -> Result<String, CalaiError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": self.build_messages(&request).await?,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(CalaiError::RateLimited {
                service: SERVICE.into(),
                retry_after_ms: retry_after_ms(response.headers()),
            });
        }

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(CalaiError::Service {
                service: SERVICE.into(),
                message: format!("HTTP {}: {}", status, truncate_chars(&error_body, 300)),
            });
        }

        let resp: serde_json::Value = response.json().await.map_err(|e| CalaiError::Service {
            service: SERVICE.into(),
            message: format!("Failed to parse response: {e}"),
        })?;

        let content = resp["choices"][0]["message"]["content"]
            .as_str()
            .map(str::trim)
            .unwrap_or("");
        if content.is_empty() {
            return Err(CalaiError::Service {
                service: SERVICE.into(),
                message: "model returned an empty answer".into(),
            });
        }

        tracing::debug!(
            model = %self.model,
            prompt_tokens = resp["usage"]["prompt_tokens"].as_u64().unwrap_or(0),
            completion_tokens = resp["usage"]["completion_tokens"].as_u64().unwrap_or(0),
            "Reasoning call complete"
        );
        Ok(content.to_string())
    }
}
