use std::path::Path;
use std::time::Duration;

use tracing::{info, warn};

use crate::aggregate::aggregate;
use crate::backend::{ExtractionBackend, SYSTEM_PROMPT};
use crate::coerce::coerce_response;
use crate::error::SourceError;
use crate::extract::{extract_text, truncate_chars};
use crate::models::{AggregateDataset, Partitioned};
use crate::normalize::normalize;

pub const PASTED_SOURCE_NAME: &str = "Pasted Syllabus";

#[derive(Debug, Clone)]
pub enum SourceInput {
    Document(Vec<u8>),
    Text(String),
    /// The file could not be read; carries the I/O error text.
    Unreadable(String),
}

/// One uploaded document or pasted block; the unit of failure isolation.
#[derive(Debug, Clone)]
pub struct Source {
    pub name: String,
    pub input: SourceInput,
}

impl Source {
    pub fn document(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            input: SourceInput::Document(bytes),
        }
    }

    pub fn pasted(text: impl Into<String>) -> Self {
        Self {
            name: PASTED_SOURCE_NAME.to_string(),
            input: SourceInput::Text(text.into()),
        }
    }

    /// A read failure is kept on the source so it fails alone during the batch.
    pub fn from_path(path: &Path) -> Self {
        let name = course_name(path);
        match std::fs::read(path) {
            Ok(bytes) => Self::document(name, bytes),
            Err(err) => Self {
                name,
                input: SourceInput::Unreadable(format!("{}: {err}", path.display())),
            },
        }
    }
}

/// File name with a trailing `.pdf` removed.
pub fn course_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    match file_name.len().checked_sub(4) {
        Some(cut)
            if file_name.is_char_boundary(cut) && file_name[cut..].eq_ignore_ascii_case(".pdf") =>
        {
            file_name[..cut].to_string()
        }
        _ => file_name,
    }
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub pacing: Duration,
    pub max_input_chars: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    /// No source produced a single record.
    NothingFound,
    Populated,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub dataset: AggregateDataset,
    pub failures: Vec<SourceError>,
    pub sources_processed: usize,
    pub sources_contributing: usize,
}

impl BatchOutcome {
    pub fn state(&self) -> BatchState {
        if self.dataset.is_empty() {
            BatchState::NothingFound
        } else {
            BatchState::Populated
        }
    }
}

/// Runs every source through extraction, the backend, coercion and normalization,
/// one at a time in submission order. A failing source is recorded and skipped.
pub async fn run_batch(
    backend: &dyn ExtractionBackend,
    sources: Vec<Source>,
    options: &BatchOptions,
) -> BatchOutcome {
    let total = sources.len();
    let mut outcome = BatchOutcome::default();
    let mut batches = Vec::with_capacity(total);
    let mut calls_made = 0usize;

    for (index, source) in sources.into_iter().enumerate() {
        let text = match source_text(&source) {
            Ok(text) => text,
            Err(err) => {
                warn!(source = %source.name, error = %err, "skipping source");
                outcome.failures.push(err);
                continue;
            }
        };

        if calls_made > 0 && !options.pacing.is_zero() {
            tokio::time::sleep(options.pacing).await;
        }
        calls_made += 1;

        let text = truncate_chars(&text, options.max_input_chars);
        match process_text(backend, &source.name, text).await {
            Ok(partition) => {
                info!(
                    source = %source.name,
                    scheduled = partition.scheduled.len(),
                    unscheduled = partition.unscheduled.len(),
                    progress = %format!("{}/{}", index + 1, total),
                    "source processed"
                );
                if !partition.is_empty() {
                    outcome.sources_contributing += 1;
                }
                batches.push(partition);
            }
            Err(err) => {
                warn!(source = %source.name, error = %err, "source failed");
                outcome.failures.push(err);
            }
        }
    }

    outcome.sources_processed = total;
    outcome.dataset = aggregate(batches);
    outcome
}

fn source_text(source: &Source) -> Result<String, SourceError> {
    let text = match &source.input {
        SourceInput::Document(bytes) => extract_text(bytes),
        SourceInput::Text(text) => text.clone(),
        SourceInput::Unreadable(reason) => {
            warn!(source = %source.name, %reason, "source file unreadable");
            String::new()
        }
    };
    if text.trim().is_empty() {
        return Err(SourceError::Extraction {
            source_name: source.name.clone(),
        });
    }
    Ok(text)
}

async fn process_text(
    backend: &dyn ExtractionBackend,
    source_name: &str,
    text: &str,
) -> Result<Partitioned, SourceError> {
    let raw = backend
        .request_structured_extraction(SYSTEM_PROMPT, text)
        .await
        .map_err(|err| SourceError::ExternalService {
            source_name: source_name.to_string(),
            message: err.to_string(),
        })?;

    let records = coerce_response(&raw, source_name)?;
    Ok(normalize(records, source_name))
}
