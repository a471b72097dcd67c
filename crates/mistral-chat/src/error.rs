use mistral_core::{ErrorCategory, NodeError};
use thiserror::Error;

/// Errors that can occur while running the node
#[derive(Debug, Error)]
pub enum ChatError {
    /// No API key in the config secret or the environment
    #[error("configuration error: no Mistral API key configured (set `mistral.api_key` or the API key environment variable)")]
    MissingCredential,

    /// An input port carried a missing or unusable value
    #[error("input error: `{port}` {reason}")]
    InvalidInput {
        /// Port id the value arrived on
        port: &'static str,
        /// What was wrong with it
        reason: String,
    },

    /// Mistral answered with a non-success status
    #[error("upstream error: Mistral returned {status}: {message}")]
    Upstream {
        /// HTTP status code
        status: u16,
        /// Error message extracted from the response body
        message: String,
    },

    /// The request never got a response
    #[error("connection error: {0}")]
    Connection(String),

    /// The response body failed while it was being read
    #[error("streaming error: {0}")]
    Streaming(String),

    /// A non-streaming body could not be decoded
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The endpoint produced no content
    #[error("empty response: Mistral returned no content")]
    EmptyResponse,

    /// The executor aborted the invocation
    #[error("cancelled: the invocation was aborted")]
    Cancelled,

    /// Unexpected internal error
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ChatError {
    /// Whether a fresh attempt of the same request may succeed
    ///
    /// Only failures that happen before any response body is consumed
    /// qualify. Client errors other than timeouts and rate limits are
    /// deterministic and are surfaced immediately.
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) => true,
            Self::Upstream { status, .. } => matches!(*status, 408 | 429 | 500..=599),
            _ => false,
        }
    }
}

impl NodeError for ChatError {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingCredential => ErrorCategory::Configuration,
            Self::InvalidInput { .. } => ErrorCategory::Input,
            Self::Upstream { .. } | Self::Connection(_) | Self::Streaming(_) | Self::InvalidResponse(_) => {
                ErrorCategory::Transport
            }
            Self::EmptyResponse => ErrorCategory::EmptyResponse,
            Self::Cancelled => ErrorCategory::Cancelled,
            Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    fn user_message(&self) -> String {
        match self {
            Self::Internal(_) => "internal error: the Mistral node failed unexpectedly".to_owned(),
            other => other.to_string(),
        }
    }
}
