//! Error types for the CLI.

use taxsim_core::{CoreError, ValidationError};

/// CLI errors.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read scenario: {0}")]
    ScenarioLoadFailed(String),

    #[error("Unsupported scenario format: {0} (expected .toml or .json)")]
    UnsupportedFormat(String),

    #[error("Failed to render output: {0}")]
    Output(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type CliResult<T> = Result<T, CliError>;

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        CliError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for CliError {
    fn from(err: toml::ser::Error) -> Self {
        CliError::ConfigSaveFailed(err.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Output(err.to_string())
    }
}

impl From<ValidationError> for CliError {
    fn from(err: ValidationError) -> Self {
        CliError::InvalidConfig(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CliError::UnsupportedFormat("yaml".into());
        assert_eq!(
            err.to_string(),
            "Unsupported scenario format: yaml (expected .toml or .json)"
        );
    }

    #[test]
    fn test_toml_error_converts() {
        let err: CliError = toml::from_str::<toml::Value>("= broken").unwrap_err().into();
        assert!(matches!(err, CliError::ConfigLoadFailed(_)));
    }
}
