//! Port metadata the host uses to draw and wire the node

use mistral_config::NodeConfig;
use serde::Serialize;

pub const MODEL: &str = "model";
pub const TEMPERATURE: &str = "temperature";
pub const MAX_TOKENS: &str = "maxTokens";
pub const TOP_P: &str = "topP";
pub const SYSTEM_PROMPT: &str = "systemPrompt";
pub const PROMPT: &str = "prompt";
pub const MESSAGES: &str = "messages";

pub const RESPONSE: &str = "response";
pub const MESSAGE: &str = "message";
pub const ALL_MESSAGES: &str = "all-messages";
pub const USAGE: &str = "usage";

/// Value type a port carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PortDataType {
    String,
    Number,
    ChatMessage,
    ChatMessages,
    /// A string, a list of strings, or chat messages
    Prompt,
    Object,
}

/// One input or output port
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortDefinition {
    pub id: &'static str,
    pub title: &'static str,
    pub data_type: PortDataType,
    pub required: bool,
}

impl PortDefinition {
    const fn optional(id: &'static str, title: &'static str, data_type: PortDataType) -> Self {
        Self {
            id,
            title,
            data_type,
            required: false,
        }
    }

    const fn required(id: &'static str, title: &'static str, data_type: PortDataType) -> Self {
        Self {
            id,
            title,
            data_type,
            required: true,
        }
    }
}

/// Input ports; the message source depends on the configured mode
pub fn input_ports(config: &NodeConfig) -> Vec<PortDefinition> {
    let mut ports = vec![
        PortDefinition::optional(MODEL, "Model", PortDataType::String),
        PortDefinition::optional(TEMPERATURE, "Temperature", PortDataType::Number),
        PortDefinition::optional(MAX_TOKENS, "Max Tokens", PortDataType::Number),
        PortDefinition::optional(TOP_P, "Top P", PortDataType::Number),
    ];

    if config.use_messages_input {
        ports.push(PortDefinition::required(MESSAGES, "Messages", PortDataType::ChatMessages));
    } else {
        ports.push(PortDefinition::optional(SYSTEM_PROMPT, "System Prompt", PortDataType::String));
        ports.push(PortDefinition::required(PROMPT, "Prompt", PortDataType::Prompt));
    }

    ports
}

pub fn output_ports() -> Vec<PortDefinition> {
    vec![
        PortDefinition::required(RESPONSE, "Response", PortDataType::String),
        PortDefinition::required(MESSAGE, "Message", PortDataType::ChatMessage),
        PortDefinition::required(ALL_MESSAGES, "All Messages", PortDataType::ChatMessages),
        PortDefinition::optional(USAGE, "Usage", PortDataType::Object),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(ports: &[PortDefinition]) -> Vec<&'static str> {
        ports.iter().map(|p| p.id).collect()
    }

    #[test]
    fn prompt_mode_ports() {
        let ports = input_ports(&NodeConfig::default());
        assert_eq!(
            ids(&ports),
            vec!["model", "temperature", "maxTokens", "topP", "systemPrompt", "prompt"]
        );
    }

    #[test]
    fn messages_mode_drops_system_prompt() {
        let config = NodeConfig {
            use_messages_input: true,
            ..NodeConfig::default()
        };
        let ports = input_ports(&config);
        assert_eq!(ids(&ports), vec!["model", "temperature", "maxTokens", "topP", "messages"]);
        assert!(ports.last().unwrap().required);
    }

    #[test]
    fn output_port_ids() {
        assert_eq!(ids(&output_ports()), vec!["response", "message", "all-messages", "usage"]);
    }

    #[test]
    fn serializes_for_host() {
        let json = serde_json::to_value(&output_ports()[2]).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "all-messages", "title": "All Messages", "dataType": "chat-messages", "required": true})
        );
    }
}
