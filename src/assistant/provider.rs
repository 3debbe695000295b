use async_trait::async_trait;
use thiserror::Error;

/// The AI provider boundary: one flat prompt in, raw text out
#[async_trait]
pub trait Provider: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

#[derive(Debug, Error)]
pub enum ProviderError {
    /// No credential configured; carries the setting name to show the user
    #[error("Missing {credential} in environment.")]
    MissingCredential { credential: String },
    #[error("request failed: {0}")]
    Request(String),
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("provider returned no text")]
    EmptyResponse,
}

impl ProviderError {
    /// The credential name if this failure is a missing credential
    pub fn missing_credential(&self) -> Option<&str> {
        match self {
            ProviderError::MissingCredential { credential } => Some(credential),
            _ => None,
        }
    }
}
