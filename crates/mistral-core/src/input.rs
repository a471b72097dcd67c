//! Loosely typed input values handed over by the host
//!
//! The host's ports accept a union of value shapes. The coercions here are
//! the narrow subset the node relies on; anything they cannot coerce comes
//! back as `None` and the caller decides how to report it.

use serde_json::Value;

use crate::message::ChatMessage;

/// A value arriving on one of the node's input ports
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    /// Plain string
    String(String),
    /// List of strings
    StringArray(Vec<String>),
    /// A single chat message
    ChatMessage(ChatMessage),
    /// A list of chat messages
    ChatMessageArray(Vec<ChatMessage>),
    /// Number
    Number(f64),
    /// Boolean
    Boolean(bool),
    /// Arbitrary JSON
    Object(Value),
}

impl InputValue {
    /// Coerce to a string
    ///
    /// Lists of strings are joined with newlines, chat messages contribute
    /// their text, and JSON objects are serialized. `null` does not coerce.
    pub fn coerce_to_text(&self) -> Option<String> {
        match self {
            Self::String(s) => Some(s.clone()),
            Self::StringArray(items) => Some(items.join("\n")),
            Self::ChatMessage(message) => Some(message.text()),
            Self::ChatMessageArray(messages) => Some(
                messages
                    .iter()
                    .map(ChatMessage::text)
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            Self::Number(n) => Some(n.to_string()),
            Self::Boolean(b) => Some(b.to_string()),
            Self::Object(Value::Null) => None,
            Self::Object(Value::String(s)) => Some(s.clone()),
            Self::Object(other) => serde_json::to_string(other).ok(),
        }
    }

    /// Coerce to an ordered list of chat messages
    ///
    /// Strings become user messages. JSON is accepted when it is a message
    /// object or an array of message objects.
    pub fn coerce_to_messages(&self) -> Option<Vec<ChatMessage>> {
        match self {
            Self::ChatMessage(message) => Some(vec![message.clone()]),
            Self::ChatMessageArray(messages) => Some(messages.clone()),
            Self::String(s) => Some(vec![ChatMessage::user(s.as_str())]),
            Self::StringArray(items) => Some(items.iter().map(|s| ChatMessage::user(s.as_str())).collect()),
            Self::Object(Value::Array(items)) => items.iter().map(ChatMessage::from_json).collect(),
            Self::Object(value) => ChatMessage::from_json(value).map(|m| vec![m]),
            Self::Number(_) | Self::Boolean(_) => None,
        }
    }

    /// Coerce to a number, parsing strings when needed
    pub fn coerce_to_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::String(s) => s.trim().parse().ok(),
            Self::Object(value) => value.as_f64(),
            _ => None,
        }
    }
}

impl From<&str> for InputValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for InputValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<f64> for InputValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<ChatMessage> for InputValue {
    fn from(message: ChatMessage) -> Self {
        Self::ChatMessage(message)
    }
}

impl From<Vec<ChatMessage>> for InputValue {
    fn from(messages: Vec<ChatMessage>) -> Self {
        Self::ChatMessageArray(messages)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn text_coercion() {
        assert_eq!(InputValue::from("hi").coerce_to_text().as_deref(), Some("hi"));
        assert_eq!(InputValue::Number(3.5).coerce_to_text().as_deref(), Some("3.5"));
        assert_eq!(InputValue::Boolean(true).coerce_to_text().as_deref(), Some("true"));
        assert_eq!(
            InputValue::StringArray(vec!["a".to_owned(), "b".to_owned()])
                .coerce_to_text()
                .as_deref(),
            Some("a\nb")
        );
        assert_eq!(
            InputValue::Object(json!({"k": 1})).coerce_to_text().as_deref(),
            Some(r#"{"k":1}"#)
        );
        assert!(InputValue::Object(Value::Null).coerce_to_text().is_none());
    }

    #[test]
    fn message_coercion_from_json_array() {
        let value = InputValue::Object(json!([
            {"type": "system", "message": "be terse"},
            {"type": "user", "message": "hi"}
        ]));
        let messages = value.coerce_to_messages().unwrap();
        assert_eq!(messages, vec![ChatMessage::system("be terse"), ChatMessage::user("hi")]);
    }

    #[test]
    fn message_coercion_fails_on_bad_json() {
        let value = InputValue::Object(json!([{"type": "user", "message": "hi"}, {"nope": true}]));
        assert!(value.coerce_to_messages().is_none());
        assert!(InputValue::Number(1.0).coerce_to_messages().is_none());
    }

    #[test]
    fn number_coercion() {
        assert_eq!(InputValue::from(" 0.25 ").coerce_to_number(), Some(0.25));
        assert_eq!(InputValue::Object(json!(2)).coerce_to_number(), Some(2.0));
        assert_eq!(InputValue::from("warm").coerce_to_number(), None);
        assert_eq!(InputValue::Boolean(false).coerce_to_number(), None);
    }
}
