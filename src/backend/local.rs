use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{prompt_messages, read_body, ExtractionBackend, Message, TEMPERATURE};
use crate::error::BackendError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3.1";

/// Ollama-style `/api/chat` server running on this machine. No credentials.
pub struct LocalBackend {
    client: Client,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<Message>,
    error: Option<String>,
}

impl LocalBackend {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl ExtractionBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.model
    }

    async fn request_structured_extraction(
        &self,
        system_prompt: &str,
        text: &str,
    ) -> Result<String, BackendError> {
        let url = format!("{}/api/chat", self.base_url);
        debug!(%url, model = %self.model, chars = text.len(), "requesting local chat");

        let body = ChatRequest {
            model: &self.model,
            messages: prompt_messages(system_prompt, text),
            stream: false,
            options: ChatOptions {
                temperature: TEMPERATURE,
            },
        };
        let response = self.client.post(&url).json(&body).send().await?;

        parse_local_chat(&read_body(response).await?)
    }
}

pub(crate) fn parse_local_chat(body: &str) -> Result<String, BackendError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|err| BackendError::Decode(format!("{err}: {body}")))?;
    if let Some(error) = response.error {
        return Err(BackendError::Decode(error));
    }
    response
        .message
        .map(|message| message.content)
        .ok_or_else(|| BackendError::Decode("response has no message".to_string()))
}
