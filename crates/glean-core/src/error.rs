use thiserror::Error;

use crate::prompt::PromptName;

#[derive(Error, Debug)]
pub enum GleanError {
    #[error("Missing input for {prompt}: `{field}` is required")]
    MissingInput { prompt: PromptName, field: &'static str },

    #[error("Unknown prompt: {name} (version {version})")]
    UnknownPrompt { name: String, version: String },

    #[error("Template error: {0}")]
    Template(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Contract violation: {0}")]
    ContractViolation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, GleanError>;
