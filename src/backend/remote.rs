use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{prompt_messages, read_body, ExtractionBackend, Message, TEMPERATURE};
use crate::error::BackendError;

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// OpenAI-compatible chat completions endpoint.
pub struct RemoteBackend {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    refusal: Option<String>,
}

impl RemoteBackend {
    pub fn new(base_url: &str, model: &str, api_key: &str) -> Result<Self, BackendError> {
        if api_key.trim().is_empty() {
            return Err(BackendError::MissingCredentials(base_url.to_string()));
        }
        Ok(Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.trim().to_string(),
        })
    }
}

#[async_trait]
impl ExtractionBackend for RemoteBackend {
    fn name(&self) -> &str {
        &self.model
    }

    async fn request_structured_extraction(
        &self,
        system_prompt: &str,
        text: &str,
    ) -> Result<String, BackendError> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(%url, model = %self.model, chars = text.len(), "requesting chat completion");

        let body = ChatRequest {
            model: &self.model,
            messages: prompt_messages(system_prompt, text),
            temperature: TEMPERATURE,
        };
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        parse_chat_completion(&read_body(response).await?)
    }
}

pub(crate) fn parse_chat_completion(body: &str) -> Result<String, BackendError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|err| BackendError::Decode(format!("{err}: {body}")))?;
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| BackendError::Decode("no choices in response".to_string()))?;

    if let Some(refusal) = choice.message.refusal {
        return Err(BackendError::Refusal(refusal));
    }
    choice
        .message
        .content
        .ok_or_else(|| BackendError::Decode("choice has no content".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_first_choice_content() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"[]"},"finish_reason":"stop"}]}"#;
        assert_eq!(parse_chat_completion(body).unwrap(), "[]");
    }

    #[test]
    fn refusal_is_an_error() {
        let body = r#"{"choices":[{"message":{"content":null,"refusal":"no"}}]}"#;
        assert!(matches!(
            parse_chat_completion(body),
            Err(BackendError::Refusal(reason)) if reason == "no"
        ));
    }

    #[test]
    fn empty_choices_is_an_error() {
        assert!(matches!(
            parse_chat_completion(r#"{"choices":[]}"#),
            Err(BackendError::Decode(_))
        ));
    }

    #[test]
    fn error_payload_is_an_error() {
        let body = r#"{"error":{"message":"Invalid API Key"}}"#;
        assert!(matches!(parse_chat_completion(body), Err(BackendError::Decode(_))));
    }

    #[test]
    fn blank_key_is_rejected() {
        assert!(matches!(
            RemoteBackend::new(DEFAULT_BASE_URL, DEFAULT_MODEL, "  "),
            Err(BackendError::MissingCredentials(_))
        ));
    }

    #[test]
    fn request_serializes_messages() {
        let request = ChatRequest {
            model: DEFAULT_MODEL,
            messages: prompt_messages("sys", "text"),
            temperature: TEMPERATURE,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], DEFAULT_MODEL);
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "text");
    }
}
