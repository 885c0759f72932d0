//! OpenAI-compatible vision client.
//!
//! One POST to `{base_url}/v1/chat/completions` with a two-part user
//! message: the prompt text and the still as a base64 `image_url` data URL.
//! Works against any provider speaking the OpenAI chat-completions wire
//! format. All connection details come from [`VisionClientSettings`]; the
//! credential is re-read from the configuration on every call so a key
//! entered after startup is picked up without restarting.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::config::SharedConfig;

use super::{DescribeError, DescriptionClient};

// ---------------------------------------------------------------------------
// VisionClientSettings
// ---------------------------------------------------------------------------

/// Connection settings for the completion endpoint.
#[derive(Debug, Clone)]
pub struct VisionClientSettings {
    /// Base URL without the `/v1/chat/completions` suffix.
    pub base_url: String,
    /// Model identifier sent with each request.
    pub model: String,
    /// Maximum completion tokens for the description.
    pub max_tokens: u32,
}

impl Default for VisionClientSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".into(),
            model: "gpt-4o-mini".into(),
            max_tokens: 300,
        }
    }
}

// ---------------------------------------------------------------------------
// OpenAiVisionClient
// ---------------------------------------------------------------------------

/// Production [`DescriptionClient`] over reqwest.
pub struct OpenAiVisionClient {
    client: reqwest::Client,
    settings: VisionClientSettings,
    config: SharedConfig,
}

impl OpenAiVisionClient {
    /// Build a client with the default endpoint settings.
    ///
    /// The reqwest client is deliberately built without a request timeout:
    /// the single describe attempt runs to completion or failure.
    pub fn new(config: SharedConfig) -> Self {
        Self::with_settings(config, VisionClientSettings::default())
    }

    /// Build a client against an explicit endpoint (useful for tests and
    /// self-hosted OpenAI-compatible providers).
    pub fn with_settings(config: SharedConfig, settings: VisionClientSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
            config,
        }
    }

    fn api_key(&self) -> Option<String> {
        let key = self.config.lock().unwrap().str_at("api.apiKey");
        let key = key.trim().to_string();
        if key.is_empty() {
            None
        } else {
            Some(key)
        }
    }
}

/// Wrap JPEG bytes as the data URL the wire format expects.
fn image_data_url(image_jpeg: &[u8]) -> String {
    format!("data:image/jpeg;base64,{}", BASE64.encode(image_jpeg))
}

/// Assemble the chat-completions request body.
fn request_body(settings: &VisionClientSettings, prompt: &str, image_jpeg: &[u8]) -> serde_json::Value {
    serde_json::json!({
        "model": settings.model,
        "messages": [
            {
                "role": "user",
                "content": [
                    { "type": "text", "text": prompt },
                    {
                        "type": "image_url",
                        "image_url": { "url": image_data_url(image_jpeg) }
                    }
                ]
            }
        ],
        "max_tokens": settings.max_tokens
    })
}

/// Default user-facing message for remote failures without a structured body.
const PROCESSING_ERROR: &str = "Error processing image.";

#[async_trait]
impl DescriptionClient for OpenAiVisionClient {
    async fn describe(&self, image_jpeg: &[u8], prompt: &str) -> Result<String, DescribeError> {
        let api_key = self.api_key().ok_or(DescribeError::Auth)?;

        let url = format!("{}/v1/chat/completions", self.settings.base_url);
        let body = request_body(&self.settings, prompt, image_jpeg);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| DescribeError::Remote(format!("{PROCESSING_ERROR} ({e})")))?;

        if !response.status().is_success() {
            // Prefer the message from a structured error body when present.
            let message = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(str::to_owned))
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| PROCESSING_ERROR.to_string());
            return Err(DescribeError::Remote(message));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| DescribeError::Remote(format!("{PROCESSING_ERROR} ({e})")))?;

        json["choices"][0]["message"]["content"]
            .as_str()
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(DescribeError::EmptyResult)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
