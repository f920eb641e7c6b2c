//! Text-generation client for pull-request reviews.
//!
//! Talks to the Gemini `generateContent` endpoint: one system instruction
//! carrying the reviewer persona and one user turn carrying the diff.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::GenerationSettings;
use crate::error::AppError;

const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Generation over a large diff can be slow.
const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_ERROR_BODY: usize = 512;

/// System instruction given to the model for every review.
pub const REVIEW_PERSONA: &str = "You are a code review assistant. You will be given a diff of a \
pull request. Your task is to review the code and provide feedback. You should be sarcastic and \
condescending, but still helpful and provide useful feedback that is factually accurate to the \
best of your knowledge";

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("AI_API_TOKEN is not set")]
    MissingApiKey,

    #[error("Generation API returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Generation request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Model returned no text")]
    EmptyResponse,
}

impl From<GenerationError> for AppError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::MissingApiKey => AppError::Configuration(err.to_string()),
            _ => AppError::Generation(err.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// Client for the review model.
#[derive(Clone)]
pub struct GenerationClient {
    http: reqwest::Client,
    api_url: String,
    model: String,
    api_key: Option<SecretString>,
}

impl GenerationClient {
    pub fn new(settings: &GenerationSettings) -> Result<Self, GenerationError> {
        let http = reqwest::Client::builder()
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .timeout(HTTP_REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key: settings.api_key.clone(),
        })
    }

    /// Review a diff with the fixed persona. Empty output is an error.
    #[instrument(skip(self, diff), fields(model = %self.model, diff_len = diff.len()))]
    pub async fn review_diff(&self, diff: &str) -> Result<String, GenerationError> {
        let api_key = self.api_key.as_ref().ok_or(GenerationError::MissingApiKey)?;

        let request = GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![TextPart {
                    text: REVIEW_PERSONA,
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![TextPart { text: diff }],
            }],
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_url, self.model
        );
        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let mut message = response.text().await.unwrap_or_default();
            if message.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !message.is_char_boundary(cut) {
                    cut -= 1;
                }
                message.truncate(cut);
            }
            return Err(GenerationError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateContentResponse = response.json().await?;
        let text = body.text();
        if text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }

        debug!(len = text.len(), "Generated review");
        Ok(text)
    }
}
