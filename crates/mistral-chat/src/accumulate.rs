//! Folding completion output into node outputs
//!
//! Streamed chunks are folded one at a time into a growing response; every
//! chunk that adds content yields a fresh snapshot. Once the stream ends,
//! token usage is settled in three tiers: usage reported inline, then usage
//! found by scanning the retained raw chunks, then a local estimate.

use mistral_core::{ChatMessage, Currency, NodeOutput, TokenUsage, UsageDetail};
use mistral_pricing::estimate_cost;
use serde_json::Value;

use crate::convert::assistant_message;
use crate::error::ChatError;
use crate::protocol::{ChatResponse, StreamChunk, WireUsage};

const CHARS_PER_TOKEN: usize = 4;

/// Where settled usage came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageOutcome {
    /// Reported by the endpoint
    Exact(TokenUsage),
    /// Derived from the response length
    Estimated(TokenUsage),
}

impl UsageOutcome {
    /// Attach cost for `model` and tag the provenance
    pub fn into_detail(self, model: &str, currency: Currency) -> UsageDetail {
        match self {
            Self::Exact(usage) => UsageDetail::Exact {
                usage,
                cost: estimate_cost(model, &usage, currency),
            },
            Self::Estimated(usage) => UsageDetail::Estimated {
                usage,
                cost: estimate_cost(model, &usage, currency),
            },
        }
    }
}

/// Settle usage for a finished stream
pub fn recover_usage(inline: Option<TokenUsage>, raw_chunks: &[Value], response: &str) -> UsageOutcome {
    if let Some(usage) = inline {
        return UsageOutcome::Exact(usage);
    }

    if let Some(usage) = scan_for_usage(raw_chunks) {
        tracing::debug!("recovered usage from raw stream chunks");
        return UsageOutcome::Exact(usage);
    }

    tracing::debug!("no usage reported, estimating from response length");
    UsageOutcome::Estimated(estimate_usage(response))
}

/// Search raw chunks for a usage record, latest first
///
/// Checks the chunk's own `usage` and any `usage` nested in its choices.
fn scan_for_usage(raw_chunks: &[Value]) -> Option<TokenUsage> {
    raw_chunks.iter().rev().find_map(|chunk| {
        let nested = chunk
            .get("choices")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|choice| choice.get("usage"));

        std::iter::once(chunk.get("usage"))
            .flatten()
            .chain(nested)
            .find_map(|value| WireUsage::from_value(value).map(TokenUsage::from))
    })
}

/// Estimate usage as one token per four characters of response
///
/// The prompt side is unknown and reported as zero.
pub fn estimate_usage(response: &str) -> TokenUsage {
    let chars = response.chars().count();
    let completion_tokens = u32::try_from(chars.div_ceil(CHARS_PER_TOKEN)).unwrap_or(u32::MAX);
    TokenUsage {
        prompt_tokens: 0,
        completion_tokens,
        total_tokens: completion_tokens,
    }
}

/// Accumulates a streamed completion
#[derive(Debug)]
pub struct StreamAccumulator {
    model: String,
    currency: Currency,
    request_messages: Vec<ChatMessage>,
    response: String,
    content_chunks: usize,
    usage: Option<TokenUsage>,
    finish_reason: Option<String>,
    raw_chunks: Vec<Value>,
}

impl StreamAccumulator {
    pub const fn new(model: String, currency: Currency, request_messages: Vec<ChatMessage>) -> Self {
        Self {
            model,
            currency,
            request_messages,
            response: String::new(),
            content_chunks: 0,
            usage: None,
            finish_reason: None,
            raw_chunks: Vec::new(),
        }
    }

    /// Fold one decoded chunk
    ///
    /// Returns a snapshot when the chunk added content. Chunks that fail
    /// typed decoding are still retained for the usage scan.
    pub fn fold(&mut self, raw: Value) -> Option<NodeOutput> {
        let chunk = match serde_json::from_value::<StreamChunk>(raw.clone()) {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::debug!(error = %e, "stream chunk did not match the expected shape");
                self.raw_chunks.push(raw);
                return None;
            }
        };
        self.raw_chunks.push(raw);

        if let Some(usage) = chunk.usage {
            self.usage = Some(usage.into());
        }

        let mut grew = false;
        for choice in chunk.choices.into_iter().filter(|c| c.index == 0) {
            if let Some(reason) = choice.finish_reason {
                self.finish_reason = Some(reason);
            }
            let delta = choice.delta.content.map(|c| c.text()).unwrap_or_default();
            if !delta.is_empty() {
                self.response.push_str(&delta);
                grew = true;
            }
        }

        if grew {
            self.content_chunks += 1;
            Some(self.snapshot())
        } else {
            None
        }
    }

    /// Current state as a partial output, without usage
    pub fn snapshot(&self) -> NodeOutput {
        build_output(
            &self.request_messages,
            ChatMessage::assistant(self.response.clone()),
            self.response.clone(),
            None,
            self.finish_reason.clone(),
        )
    }

    /// Text received so far
    pub fn response(&self) -> &str {
        &self.response
    }

    /// Settle usage and cost into the final output
    ///
    /// # Errors
    ///
    /// Returns `ChatError::EmptyResponse` when no chunk carried content
    pub fn finish(self) -> Result<NodeOutput, ChatError> {
        if self.content_chunks == 0 {
            return Err(ChatError::EmptyResponse);
        }

        let outcome = recover_usage(self.usage, &self.raw_chunks, &self.response);
        tracing::debug!(
            chunks = self.raw_chunks.len(),
            content_chunks = self.content_chunks,
            estimated = matches!(outcome, UsageOutcome::Estimated(_)),
            "stream finished"
        );

        Ok(build_output(
            &self.request_messages,
            ChatMessage::assistant(self.response.clone()),
            self.response,
            Some(outcome.into_detail(&self.model, self.currency)),
            self.finish_reason,
        ))
    }
}

/// Final output for a non-streaming response
///
/// # Errors
///
/// Returns `ChatError::EmptyResponse` when the first choice has neither
/// text nor tool calls
pub fn complete_from_response(
    model: &str,
    currency: Currency,
    request_messages: &[ChatMessage],
    response: ChatResponse,
) -> Result<NodeOutput, ChatError> {
    let usage = response.usage;
    let choice = response.choices.into_iter().next().ok_or(ChatError::EmptyResponse)?;

    let text = choice.message.content.map(|c| c.text()).unwrap_or_default();
    let has_tool_calls = choice.message.tool_calls.as_ref().is_some_and(|calls| !calls.is_empty());
    if text.is_empty() && !has_tool_calls {
        return Err(ChatError::EmptyResponse);
    }

    let outcome = match usage {
        Some(usage) => UsageOutcome::Exact(usage.into()),
        None => UsageOutcome::Estimated(estimate_usage(&text)),
    };

    Ok(build_output(
        request_messages,
        assistant_message(text.clone(), choice.message.tool_calls),
        text,
        Some(outcome.into_detail(model, currency)),
        choice.finish_reason,
    ))
}

fn build_output(
    request_messages: &[ChatMessage],
    message: ChatMessage,
    response: String,
    usage: Option<UsageDetail>,
    finish_reason: Option<String>,
) -> NodeOutput {
    let mut all_messages = Vec::with_capacity(request_messages.len() + 1);
    all_messages.extend_from_slice(request_messages);
    all_messages.push(message.clone());

    NodeOutput {
        response,
        message,
        all_messages,
        usage,
        finish_reason,
    }
}
