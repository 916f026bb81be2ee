/// Failure talking to an extraction backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("model refused the request: {0}")]
    Refusal(String),

    #[error("missing API key for {0}")]
    MissingCredentials(String),
}

/// A failure scoped to one source. The batch keeps going after any of these.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("{source_name}: no text could be extracted")]
    Extraction { source_name: String },

    #[error("{source_name}: extraction service failed: {message}")]
    ExternalService {
        source_name: String,
        message: String,
    },

    #[error("{source_name}: response is not a JSON array ({reason}); got {raw_excerpt:?}")]
    Parse {
        source_name: String,
        reason: String,
        raw_excerpt: String,
    },
}

impl SourceError {
    pub fn source_name(&self) -> &str {
        match self {
            SourceError::Extraction { source_name }
            | SourceError::ExternalService { source_name, .. }
            | SourceError::Parse { source_name, .. } => source_name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SourceError::Extraction { .. } => "extraction",
            SourceError::ExternalService { .. } => "external service",
            SourceError::Parse { .. } => "parse",
        }
    }
}
