use thiserror::Error;

use locshot_core::InterceptError;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("interception failed: {0}")]
    Intercept(#[from] InterceptError),
    #[error("failed to encode report JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("report I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration `{key}`: {reason}")]
    Config { key: String, reason: String },
    #[error("localization producer is already installed")]
    ProducerInstalled,
}

pub type Result<T> = std::result::Result<T, HarnessError>;

impl HarnessError {
    pub(crate) fn config(key: &str, reason: impl Into<String>) -> Self {
        Self::Config {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}
