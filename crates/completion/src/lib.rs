//! Text generation for agent replies.
//!
//! A [`CompletionClient`] receives a persona system instruction, the prior
//! conversation as role-tagged [`Turn`]s and the new user input, and returns
//! the generated reply. [`GeminiClient`] implements it against the Gemini
//! `generateContent` REST endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod gemini;

pub use gemini::GeminiClient;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion provider is not configured")]
    NotConfigured,
    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("completion provider returned {status}: {message}")]
    Provider { status: u16, message: String },
    #[error("completion was blocked: {0}")]
    Blocked(String),
    #[error("completion provider returned no text")]
    EmptyResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

/// One entry of conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Turn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![Part { text: text.into() }],
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::new(Role::Model, text)
    }

    pub fn text(&self) -> String {
        self.parts.iter().map(|part| part.text.as_str()).collect()
    }
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Generate a reply to `input` given the prior turns. One call, no retries.
    async fn generate(
        &self,
        system_instruction: &str,
        history: &[Turn],
        input: &str,
    ) -> Result<String, CompletionError>;
}
