//! Host-facing types for the Mistral chat node
//!
//! Everything the graph host hands to the node (chat messages, loosely typed
//! input values, a cancellation signal, a partial-output sink) and everything
//! the node hands back (outputs, usage and cost detail) lives here, so the
//! request/stream machinery in `mistral-chat` stays independent of any one host.

#![allow(clippy::must_use_candidate)]

pub mod context;
pub mod error;
pub mod input;
pub mod message;
pub mod output;

pub use context::{InvocationContext, PartialOutputSink};
pub use error::{ErrorCategory, NodeError};
pub use input::InputValue;
pub use message::{ChatMessage, MessageText, ToolCall};
pub use output::{CostEstimate, Currency, NodeOutput, TokenUsage, UsageDetail};
