//! OpenAI-compatible chat-completions client.

use crate::config::GeneratorConfig;
use crate::error::{Result, SignscribeError};
use crate::generate::prompt::{build_prompt, max_tokens, tidy_output};
use crate::generate::{GenerationRequest, TextGenerator};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Text generator backed by a hosted chat-completions endpoint.
pub struct HttpGenerator {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
}

impl HttpGenerator {
    /// Builds a client from config. The API key is read from the environment
    /// variable named by `api_key_env`; a missing key is only an error once a
    /// request is rejected by the server.
    pub fn from_config(config: &GeneratorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| SignscribeError::Generation {
                message: format!("Failed to build HTTP client: {e}"),
            })?;

        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            tracing::warn!(env = %config.api_key_env, "No generator API key set");
        }

        Ok(Self {
            client,
            url: completions_url(&config.endpoint),
            model: config.model.clone(),
            api_key,
            temperature: config.temperature,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn completions_url(endpoint: &str) -> String {
    format!("{}/chat/completions", endpoint.trim_end_matches('/'))
}

#[async_trait::async_trait]
impl TextGenerator for HttpGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let prompt = build_prompt(&request.gloss, &request.context);
        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: &prompt,
            }],
            max_tokens: max_tokens(&request.gloss, &prompt),
            temperature: self.temperature,
        };

        let mut builder = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| SignscribeError::Generation {
            message: format!("request to {} failed: {e}", self.url),
        })?;

        if !response.status().is_success() {
            return Err(SignscribeError::Generation {
                message: format!("{} returned status {}", self.url, response.status()),
            });
        }

        let text = response.text().await.map_err(|e| SignscribeError::Generation {
            message: format!("Failed to read response: {e}"),
        })?;
        let parsed: ChatResponse = serde_json::from_str(&text).map_err(|e| SignscribeError::Generation {
            message: format!("Failed to parse response: {e}"),
        })?;

        let raw = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        Ok(tidy_output(&raw, &prompt))
    }

    fn name(&self) -> &str {
        &self.model
    }
}
