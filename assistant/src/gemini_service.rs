use crate::models::*;
use async_trait::async_trait;
use reqwest::Client;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// A hosted text-generation endpoint.
///
/// `contents` is the conversation so far, oldest first; a one-shot prompt is a
/// single user turn.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, contents: &[ChatTurn]) -> Result<String, ApiError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("Gemini API error ({status}): {body}")]
    Status { status: u16, body: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("no response generated{}", .0.as_deref().map(|r| format!(" (blocked: {r})")).unwrap_or_default())]
    EmptyResponse(Option<String>),
}

#[derive(Clone)]
pub struct GeminiSettings {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    pub generation: GeminiGenerationConfig,
}

impl GeminiSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            generation: GeminiGenerationConfig::default(),
        }
    }
}

impl fmt::Debug for GeminiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiSettings")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("generation", &self.generation)
            .finish()
    }
}

pub struct GeminiService {
    client: Client,
    settings: GeminiSettings,
}

impl GeminiService {
    pub fn new(settings: GeminiSettings) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        log::info!(
            "Gemini client ready (model {}, timeout {:?})",
            settings.model,
            settings.timeout
        );

        Ok(Self { client, settings })
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.model
        )
    }

    fn build_request(&self, contents: &[ChatTurn]) -> GeminiRequest {
        let generation = &self.settings.generation;
        GeminiRequest {
            contents: contents.iter().map(GeminiContent::from).collect(),
            generation_config: if generation.is_empty() {
                None
            } else {
                Some(generation.clone())
            },
        }
    }

    fn map_transport(&self, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout(self.settings.timeout)
        } else {
            // reqwest includes the URL in its messages; strip it so the key never leaks.
            ApiError::Transport(err.without_url().to_string())
        }
    }
}

#[async_trait]
impl GenerativeModel for GeminiService {
    async fn generate(&self, contents: &[ChatTurn]) -> Result<String, ApiError> {
        let request = self.build_request(contents);

        log::debug!(
            "Sending {} turn(s) to {}",
            request.contents.len(),
            self.settings.model
        );

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.settings.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.map_err(|e| self.map_transport(e))?;
            log::warn!("Gemini returned {}", status);
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(|e| self.map_transport(e))?;
        let gemini_response: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;

        response_text(gemini_response)
    }
}

/// Text of the first candidate, all text parts joined.
pub fn response_text(response: GeminiResponse) -> Result<String, ApiError> {
    let block_reason = response
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason);

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        return Err(ApiError::EmptyResponse(block_reason));
    }

    Ok(text)
}
