//! Configuration management for toolloop.
//!
//! Configuration can be set via environment variables:
//! - `OPENAI_API_KEY` - Required. Your OpenAI API key. Never logged.
//! - `DEFAULT_MODEL` - Optional. The model to use. Defaults to `gpt-4o-mini`.
//! - `MAX_ITERATIONS` - Optional. Maximum tool-call rounds per user turn. Defaults to `5`.
//! - `OUTPUT_DIR` - Optional. Directory for generated artifacts. Defaults to `generated_artifacts`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// OpenAI API key
    pub api_key: String,

    /// Model identifier
    pub model: String,

    /// Maximum tool-call rounds per user turn
    pub max_iterations: usize,

    /// Directory where tool-produced artifacts are stored
    pub output_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `OPENAI_API_KEY` is not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()))?;

        let model = std::env::var("DEFAULT_MODEL")
            .unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let max_iterations = std::env::var("MAX_ITERATIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("MAX_ITERATIONS".to_string(), format!("{}", e)))?;

        let output_dir = std::env::var("OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("generated_artifacts"));

        Ok(Self {
            api_key,
            model,
            max_iterations,
            output_dir,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: String, model: String, output_dir: PathBuf) -> Self {
        Self {
            api_key,
            model,
            max_iterations: 5,
            output_dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_applies_default_iteration_cap() {
        let config = Config::new(
            "test-key".to_string(),
            "gpt-4o-mini".to_string(),
            PathBuf::from("/tmp/out"),
        );
        assert_eq!(config.max_iterations, 5);
        assert_eq!(config.model, "gpt-4o-mini");
    }
}
