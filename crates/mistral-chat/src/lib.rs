//! Mistral chat completion node
//!
//! Turns host inputs into a Mistral chat completion request, sends it, and
//! folds the (optionally streamed) response into node outputs with token
//! usage and cost attached. Streamed responses surface a growing partial
//! output after every content-bearing chunk.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod accumulate;
pub mod builder;
pub mod convert;
pub mod decode;
pub mod error;
pub mod node;
pub mod ports;
pub mod protocol;
pub mod provider;
pub mod retry;

pub use accumulate::{StreamAccumulator, UsageOutcome};
pub use builder::{NodeInputs, PreparedRequest, PromptInput, RequestBuilder};
pub use decode::SseDecoder;
pub use error::ChatError;
pub use node::MistralNode;
pub use protocol::CompletionRequest;
pub use provider::{ByteStream, CompletionBackend, MistralProvider};
