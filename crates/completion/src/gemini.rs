use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use societas_config::CompletionConfig;

use crate::{CompletionClient, CompletionError, Part, Role, Turn};

const API_KEY_ENV: &str = "GEMINI_API_KEY";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Client for the Gemini `models/{model}:generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(config: &CompletionConfig) -> Result<Self, CompletionError> {
        let mut builder = Client::builder();
        if let Some(seconds) = config.request_timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }
        Ok(Self::with_client(builder.build()?, config))
    }

    pub fn with_client(client: Client, config: &CompletionConfig) -> Self {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty());

        if api_key.is_none() {
            warn!("no gemini api key configured, completions will fail");
        }

        Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionClient for GeminiClient {
    async fn generate(
        &self,
        system_instruction: &str,
        history: &[Turn],
        input: &str,
    ) -> Result<String, CompletionError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(CompletionError::NotConfigured)?;

        let mut contents = history.to_vec();
        contents.push(Turn::new(Role::User, input));

        let request = GenerateContentRequest {
            system_instruction: (!system_instruction.trim().is_empty()).then(|| {
                SystemInstruction {
                    parts: vec![Part {
                        text: system_instruction.to_string(),
                    }],
                }
            }),
            contents,
        };

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        debug!(model = %self.model, turns = request.contents.len(), "requesting completion");

        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, api_key)
            .json(&request)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorWrapper>(&body)
                .ok()
                .and_then(|wrapper| wrapper.error.message)
                .unwrap_or(body);
            return Err(CompletionError::Provider { status, message });
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(transport)?;
        extract_text(parsed)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    contents: Vec<Turn>,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Request URLs never reach error messages.
fn transport(err: reqwest::Error) -> CompletionError {
    CompletionError::Http(err.without_url())
}

fn extract_text(response: GenerateContentResponse) -> Result<String, CompletionError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(match response.prompt_feedback.and_then(|f| f.block_reason) {
            Some(reason) => CompletionError::Blocked(reason),
            None => CompletionError::EmptyResponse,
        });
    };

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        return Err(CompletionError::EmptyResponse);
    }
    Ok(text)
}
