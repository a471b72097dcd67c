//! Completion backends

pub mod mistral;

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;
use tokio_util::sync::CancellationToken;

use crate::error::ChatError;
use crate::protocol::{ChatResponse, CompletionRequest};

pub use mistral::MistralProvider;

/// Raw response body of a streamed completion
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ChatError>> + Send>>;

/// Sends completion requests somewhere that answers like Mistral
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Send a non-streaming request and decode the body
    async fn complete(&self, request: &CompletionRequest, cancel: &CancellationToken)
    -> Result<ChatResponse, ChatError>;

    /// Send a streaming request and hand back the undecoded body
    ///
    /// Resolves once response headers arrive with a success status.
    async fn open_stream(&self, request: &CompletionRequest, cancel: &CancellationToken)
    -> Result<ByteStream, ChatError>;
}
