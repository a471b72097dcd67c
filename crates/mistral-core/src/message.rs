use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Text carried by a chat message
///
/// Hosts hand over either one string or an ordered list of segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageText {
    /// A single text value
    Text(String),
    /// Ordered text segments
    Segments(Vec<String>),
}

impl MessageText {
    /// Flatten into one string, joining segments with a single space
    ///
    /// Lossy: segment boundaries cannot be recovered from the result.
    pub fn joined(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Segments(segments) => segments.join(" "),
        }
    }
}

impl From<String> for MessageText {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for MessageText {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

/// A tool/function call reported by the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call identifier assigned by the model
    pub id: String,
    /// Function name
    pub name: String,
    /// JSON-encoded arguments
    pub arguments: String,
}

/// Chat message as the host represents it
///
/// Serialized as `{"type": <tag>, "message": ...}`; the `role`/`content`
/// spelling is accepted on input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawMessage", into = "RawMessage")]
pub enum ChatMessage {
    /// System instruction
    System {
        /// Message text
        message: MessageText,
    },
    /// User turn
    User {
        /// Message text
        message: MessageText,
    },
    /// Assistant turn
    Assistant {
        /// Message text
        message: MessageText,
        /// Tool calls, only ever populated from a model response
        function_calls: Option<Vec<ToolCall>>,
    },
    /// A message type this node does not know about yet
    Other {
        /// The host's tag for the message
        tag: String,
        /// Message text
        message: MessageText,
    },
}

impl ChatMessage {
    /// Build a system message
    pub fn system(text: impl Into<MessageText>) -> Self {
        Self::System { message: text.into() }
    }

    /// Build a user message
    pub fn user(text: impl Into<MessageText>) -> Self {
        Self::User { message: text.into() }
    }

    /// Build an assistant message without tool calls
    pub fn assistant(text: impl Into<MessageText>) -> Self {
        Self::Assistant {
            message: text.into(),
            function_calls: None,
        }
    }

    /// The host tag for this message
    pub fn tag(&self) -> &str {
        match self {
            Self::System { .. } => "system",
            Self::User { .. } => "user",
            Self::Assistant { .. } => "assistant",
            Self::Other { tag, .. } => tag,
        }
    }

    /// Borrow the message text
    pub const fn message(&self) -> &MessageText {
        match self {
            Self::System { message }
            | Self::User { message }
            | Self::Assistant { message, .. }
            | Self::Other { message, .. } => message,
        }
    }

    /// Message text with segments joined
    pub fn text(&self) -> String {
        self.message().joined()
    }

    /// Parse a message from the host's JSON shape
    ///
    /// The text is either a string or an array of strings. Returns `None`
    /// for anything else.
    pub fn from_json(value: &Value) -> Option<Self> {
        Self::deserialize(value).ok()
    }
}

#[derive(Serialize, Deserialize)]
struct RawMessage {
    #[serde(rename = "type", alias = "role")]
    tag: String,
    #[serde(alias = "content")]
    message: MessageText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_calls: Option<Vec<ToolCall>>,
}

impl From<RawMessage> for ChatMessage {
    fn from(raw: RawMessage) -> Self {
        let RawMessage {
            tag,
            message,
            function_calls,
        } = raw;
        match tag.as_str() {
            "system" => Self::System { message },
            "user" => Self::User { message },
            "assistant" => Self::Assistant {
                message,
                function_calls,
            },
            _ => Self::Other { tag, message },
        }
    }
}

impl From<ChatMessage> for RawMessage {
    fn from(message: ChatMessage) -> Self {
        let tag = message.tag().to_owned();
        let (message, function_calls) = match message {
            ChatMessage::Assistant {
                message,
                function_calls,
            } => (message, function_calls),
            ChatMessage::System { message } | ChatMessage::User { message } | ChatMessage::Other { message, .. } => {
                (message, None)
            }
        };
        Self {
            tag,
            message,
            function_calls,
        }
    }
}
