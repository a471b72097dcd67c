//! Mistral chat completions wire types
//!
//! Response types are lenient: every field the node does not strictly need
//! defaults, so extra or missing fields from newer API versions do not fail
//! the whole chunk.

use mistral_core::TokenUsage;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireRole {
    System,
    User,
    Assistant,
    Tool,
}

/// Message as sent to the endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireMessage {
    pub role: WireRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<WireToolCall>>,
}

/// Tool call in request or response form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireToolCall {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default = "default_tool_type")]
    pub call_type: String,
    pub function: WireFunctionCall,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireFunctionCall {
    pub name: String,
    #[serde(default, deserialize_with = "arguments_as_string")]
    pub arguments: String,
}

fn default_tool_type() -> String {
    "function".to_owned()
}

// Arguments arrive as a JSON-encoded string, occasionally as an object
fn arguments_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Request body for `POST /chat/completions`
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
    pub top_p: f64,
    pub stream: bool,
    pub safe_prompt: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub random_seed: Option<u64>,
    /// Bearer credential, never part of the body or the cache key
    #[serde(skip)]
    pub credential: SecretString,
}

/// Token usage as reported by the endpoint
///
/// Both counts are required; an object missing either is not a usage record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct WireUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

impl WireUsage {
    /// Parse a raw `usage` value, `None` unless it is a complete record
    pub fn from_value(value: &Value) -> Option<Self> {
        Self::deserialize(value).ok()
    }
}

// An incomplete usage object must not fail the chunk it rides on
fn lenient_usage<'de, D>(deserializer: D) -> Result<Option<WireUsage>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(WireUsage::from_value))
}

impl From<WireUsage> for TokenUsage {
    fn from(usage: WireUsage) -> Self {
        let total_tokens = if usage.total_tokens == 0 {
            usage.prompt_tokens.saturating_add(usage.completion_tokens)
        } else {
            usage.total_tokens
        };
        Self {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens,
        }
    }
}

/// Non-streaming response body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChatResponse {
    pub id: Option<String>,
    pub model: Option<String>,
    pub choices: Vec<ResponseChoice>,
    #[serde(deserialize_with = "lenient_usage")]
    pub usage: Option<WireUsage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResponseChoice {
    pub index: u32,
    pub message: ResponseMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResponseMessage {
    pub role: Option<String>,
    pub content: Option<ContentValue>,
    pub tool_calls: Option<Vec<WireToolCall>>,
}

/// One decoded stream event
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StreamChunk {
    pub id: Option<String>,
    pub model: Option<String>,
    pub choices: Vec<StreamChoice>,
    #[serde(deserialize_with = "lenient_usage")]
    pub usage: Option<WireUsage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StreamChoice {
    pub index: u32,
    pub delta: StreamDelta,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StreamDelta {
    pub role: Option<String>,
    pub content: Option<ContentValue>,
}

/// Message content: plain text or typed parts
///
/// Reasoning models send a list of parts; only `text` parts count toward
/// the response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ContentValue {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type", default)]
    pub part_type: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl ContentValue {
    /// Concatenated text content
    pub fn text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Parts(parts) => parts
                .iter()
                .filter(|part| part.part_type == "text")
                .filter_map(|part| part.text.as_deref())
                .collect(),
        }
    }
}

/// Pull a human-readable message out of an error response body
///
/// Mistral answers with `{"message": ...}`, `{"error": {"message": ...}}`
/// or, from the validation layer, `{"detail": ...}`. Anything else is
/// returned as-is.
pub fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.to_owned();
    };

    let candidate = value
        .get("message")
        .or_else(|| value.get("error").and_then(|e| e.get("message")))
        .or_else(|| value.get("detail"));

    match candidate {
        Some(Value::String(message)) => message.clone(),
        Some(other) if !other.is_null() => other.to_string(),
        _ => body.to_owned(),
    }
}
