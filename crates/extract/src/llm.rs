use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const VERTEX_BASE_URL: &str = "https://aiplatform.googleapis.com";

/// Anything that turns a prompt into a completion
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String>;

    /// Label used in logs and cache keys
    fn describe(&self) -> String;
}

/// Non-2xx reply from a provider
#[derive(Debug, Error)]
#[error("{provider} request failed: {status} {body}")]
pub struct StatusError {
    pub provider: Provider,
    pub status: reqwest::StatusCode,
    pub body: String,
}

impl StatusError {
    fn new(provider: Provider, status: reqwest::StatusCode, body: &str) -> Self {
        Self {
            provider,
            status,
            body: body.trim().to_string(),
        }
    }

    /// Rate limits and server errors may go away on their own
    pub fn is_transient(&self) -> bool {
        self.status == reqwest::StatusCode::TOO_MANY_REQUESTS || self.status.is_server_error()
    }
}

/// Remote model backends selectable from the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    OpenAI,
    Gemini,
    Vertex,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::OpenAI, Provider::Gemini, Provider::Vertex];

    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAI => "OpenAI",
            Provider::Gemini => "Gemini",
            Provider::Vertex => "Vertex",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::OpenAI => OPENAI_BASE_URL,
            Provider::Gemini => GEMINI_BASE_URL,
            Provider::Vertex => VERTEX_BASE_URL,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAI),
            "gemini" => Ok(Provider::Gemini),
            "vertex" | "vertexai" | "vertex-ai" | "vertex_ai" => Ok(Provider::Vertex),
            other => anyhow::bail!("Unknown provider: {other:?}"),
        }
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Chat-completion client for one provider, bound to one API key
#[derive(Clone)]
pub struct ProviderClient {
    provider: Provider,
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl ProviderClient {
    pub fn new(provider: Provider, api_key: String, model: String, client: reqwest::Client) -> Self {
        Self {
            provider,
            api_key,
            model,
            base_url: provider.default_base_url().to_string(),
            client,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn openai_chat(&self, prompt: &str, temperature: f32) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            temperature,
        };

        let response = self.client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to OpenAI")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StatusError::new(self.provider, status, &body).into());
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI response")?;

        Ok(completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }

    async fn generate_content(&self, path: &str, prompt: &str, temperature: f32) -> Result<String> {
        let url = format!("{}/{}/{}:generateContent", self.base_url, path, self.model);

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig { temperature },
        };

        let response = self.client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            // The key travels in the query string; keep the URL out of errors
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("Failed to send request to {}", self.provider))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StatusError::new(self.provider, status, &body).into());
        }

        let generated: GenerateContentResponse = response
            .json()
            .await
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("Failed to parse {} response", self.provider))?;

        let text = generated
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();

        Ok(text)
    }
}

#[async_trait]
impl ChatModel for ProviderClient {
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        debug!(
            provider = %self.provider,
            model = %self.model,
            prompt_chars = prompt.chars().count(),
            "Sending completion request"
        );

        match self.provider {
            Provider::OpenAI => self.openai_chat(prompt, temperature).await,
            Provider::Gemini => self.generate_content("v1beta/models", prompt, temperature).await,
            Provider::Vertex => {
                self.generate_content("v1/publishers/google/models", prompt, temperature)
                    .await
            }
        }
    }

    fn describe(&self) -> String {
        format!("{}/{}", self.provider, self.model)
    }
}
