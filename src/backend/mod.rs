use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;

pub mod local;
pub mod remote;

pub use local::LocalBackend;
pub use remote::RemoteBackend;

pub const SYSTEM_PROMPT: &str = r#"You are a strictly JSON-speaking assistant.
Extract ALL course deadlines, exams, projects, and assignments.

CRITICAL INSTRUCTION:
If an assignment is listed but has NO specific date, YOU MUST STILL INCLUDE IT.
Set the 'date' field to the string "TBD".

Return a list of JSON objects with these keys:
- 'event': Name of the task
- 'date': YYYY-MM-DD format OR "TBD"
- 'type': "Exam", "Homework", "Project", or "Quiz"
- 'weight': numeric percentage (e.g. 20 for 20%) - return 0 if unknown.

Return ONLY the valid JSON list."#;

pub const TEMPERATURE: f32 = 0.1;

/// A generative-text service that turns syllabus text into a raw JSON reply.
#[async_trait]
pub trait ExtractionBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn request_structured_extraction(
        &self,
        system_prompt: &str,
        text: &str,
    ) -> Result<String, BackendError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Remote,
    Local,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub(crate) struct Message {
    pub role: String,
    pub content: String,
}

pub(crate) fn prompt_messages(system_prompt: &str, text: &str) -> Vec<Message> {
    vec![
        Message {
            role: "system".to_string(),
            content: system_prompt.to_string(),
        },
        Message {
            role: "user".to_string(),
            content: text.to_string(),
        },
    ]
}

/// Reads the body and fails on any non-success status.
pub(crate) async fn read_body(response: reqwest::Response) -> Result<String, BackendError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(BackendError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}
