use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::backend::{local, remote, BackendKind};

pub const DEFAULT_PACING_MS: u64 = 1_000;
pub const DEFAULT_MAX_INPUT_CHARS: usize = 15_000;

/// Layered settings: optional `scout.toml`, then `SCOUT_*` environment variables.
/// CLI flags are applied on top by the caller.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub api_key: Option<String>,
    pub backend: BackendKind,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub pacing_ms: u64,
    pub max_input_chars: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            backend: BackendKind::Remote,
            model: None,
            base_url: None,
            pacing_ms: DEFAULT_PACING_MS,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        }
    }
}

impl Settings {
    pub fn load(secrets_file: &Path) -> anyhow::Result<Self> {
        let mut settings: Settings = config::Config::builder()
            .add_source(config::File::from(secrets_file).required(false))
            .add_source(config::Environment::with_prefix("SCOUT").try_parsing(true))
            .build()
            .context("failed to read settings")?
            .try_deserialize()
            .context("invalid settings")?;

        if settings.api_key.is_none() {
            settings.api_key = std::env::var("GROQ_API_KEY").ok();
        }
        settings.api_key = settings.api_key.filter(|key| !key.trim().is_empty());
        Ok(settings)
    }

    pub fn model(&self) -> &str {
        match (&self.model, self.backend) {
            (Some(model), _) => model,
            (None, BackendKind::Remote) => remote::DEFAULT_MODEL,
            (None, BackendKind::Local) => local::DEFAULT_MODEL,
        }
    }

    pub fn base_url(&self) -> &str {
        match (&self.base_url, self.backend) {
            (Some(url), _) => url,
            (None, BackendKind::Remote) => remote::DEFAULT_BASE_URL,
            (None, BackendKind::Local) => local::DEFAULT_BASE_URL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_pick_backend_specific_endpoints() {
        let mut settings = Settings::default();
        assert_eq!(settings.model(), remote::DEFAULT_MODEL);
        assert_eq!(settings.base_url(), remote::DEFAULT_BASE_URL);

        settings.backend = BackendKind::Local;
        assert_eq!(settings.model(), local::DEFAULT_MODEL);
        assert_eq!(settings.base_url(), local::DEFAULT_BASE_URL);

        settings.model = Some("mixtral".to_string());
        assert_eq!(settings.model(), "mixtral");
    }

    #[test]
    fn reads_secrets_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "api_key = \"gsk_test\"\nbackend = \"local\"\npacing_ms = 0").unwrap();

        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.api_key.as_deref(), Some("gsk_test"));
        assert_eq!(settings.backend, BackendKind::Local);
        assert_eq!(settings.pacing_ms, 0);
        assert_eq!(settings.max_input_chars, DEFAULT_MAX_INPUT_CHARS);
    }
}
