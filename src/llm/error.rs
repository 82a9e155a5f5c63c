//! Error types for the language-model client.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while talking to the generative model provider.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The HTTP request failed or the provider returned a failure status.
    #[error("chat request failed: {message}")]
    Transport {
        /// HTTP status code, when the provider answered at all.
        status_code: Option<u16>,
        message: String,
        /// Whether a later identical request could plausibly succeed.
        retryable: bool,
    },

    /// The per-call timeout elapsed before a response arrived.
    #[error("chat request timed out")]
    Timeout,

    /// The provider rejected the credential.
    #[error("invalid model-provider credential: {0}")]
    InvalidCredential(String),

    /// The provider throttled the request.
    #[error("rate limited by the model provider")]
    RateLimited {
        /// Provider-suggested wait, from the `retry-after` header.
        retry_after: Option<Duration>,
    },

    /// The provider answered with a body we could not interpret at all.
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    /// The completion did not satisfy the declared response schema, even
    /// after the bounded retry.
    #[error("completion did not satisfy the response schema: {0}")]
    SchemaViolation(String),

    /// Prompt template rendering failed.
    #[error("prompt rendering failed: {0}")]
    Template(#[from] minijinja::Error),

    /// Serializing the schema descriptor failed.
    #[error("schema serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LlmError {
    /// Whether a later identical call could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { retryable, .. } => *retryable,
            Self::Timeout | Self::RateLimited { .. } => true,
            Self::InvalidCredential(_)
            | Self::MalformedResponse(_)
            | Self::SchemaViolation(_)
            | Self::Template(_)
            | Self::Serialization(_) => false,
        }
    }
}
