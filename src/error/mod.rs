use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApnError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Delivery error ({client}): {reason}")]
    Delivery { client: String, reason: String },
}

impl ApnError {
    /// Build a delivery error reported by the client named `client`
    pub fn delivery(client: impl Into<String>, reason: impl Into<String>) -> Self {
        ApnError::Delivery {
            client: client.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ApnError>;
