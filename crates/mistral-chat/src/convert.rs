//! Conversion between host chat messages and Mistral wire messages

use mistral_core::{ChatMessage, MessageText, ToolCall};

use crate::protocol::{WireFunctionCall, WireMessage, WireRole, WireToolCall};

/// Constructor for a host message from its text
pub type MessageConstructor = fn(MessageText) -> ChatMessage;

// -- Outbound: host -> wire --

/// Map a host message tag onto a wire role
///
/// Total: tags the endpoint does not know are sent as `user`.
pub fn to_wire_role(tag: &str) -> WireRole {
    match tag {
        "system" => WireRole::System,
        "user" => WireRole::User,
        "assistant" => WireRole::Assistant,
        other => {
            tracing::warn!(tag = other, "unknown chat message type, sending as user");
            WireRole::User
        }
    }
}

/// Convert a host message into its wire form
///
/// Segmented text is joined with single spaces. Tool calls pass through
/// only when the message already carries them.
pub fn to_wire_message(message: &ChatMessage) -> WireMessage {
    let tool_calls = match message {
        ChatMessage::Assistant {
            function_calls: Some(calls),
            ..
        } if !calls.is_empty() => Some(calls.iter().map(to_wire_tool_call).collect()),
        _ => None,
    };

    WireMessage {
        role: to_wire_role(message.tag()),
        content: message.text(),
        tool_calls,
    }
}

fn to_wire_tool_call(call: &ToolCall) -> WireToolCall {
    WireToolCall {
        id: call.id.clone(),
        call_type: "function".to_owned(),
        function: WireFunctionCall {
            name: call.name.clone(),
            arguments: call.arguments.clone(),
        },
    }
}

// -- Inbound: wire -> host --

/// Pick the host message constructor for a wire role
///
/// Roles without a host counterpart (including `tool`) become user
/// messages.
pub fn from_wire_role(role: &str) -> MessageConstructor {
    match role {
        "system" => |message| ChatMessage::System { message },
        "assistant" => |message| ChatMessage::Assistant {
            message,
            function_calls: None,
        },
        _ => |message| ChatMessage::User { message },
    }
}

/// Build the assistant message for a completed response
pub fn assistant_message(text: String, tool_calls: Option<Vec<WireToolCall>>) -> ChatMessage {
    let function_calls = tool_calls.filter(|calls| !calls.is_empty()).map(|calls| {
        calls
            .into_iter()
            .map(|call| ToolCall {
                id: call.id,
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect()
    });

    ChatMessage::Assistant {
        message: MessageText::Text(text),
        function_calls,
    }
}
