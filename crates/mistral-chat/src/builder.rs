//! Completion request construction
//!
//! Merges node defaults with per-invocation port values and normalizes the
//! prompt into the message list sent to the endpoint.

use std::collections::HashMap;

use mistral_config::NodeConfig;
use mistral_core::{ChatMessage, InputValue};
use secrecy::SecretString;

use crate::convert::to_wire_message;
use crate::error::ChatError;
use crate::ports;
use crate::protocol::CompletionRequest;

/// Values connected to the node's input ports for one invocation
///
/// Unconnected ports are `None` and fall back to the node defaults.
#[derive(Debug, Clone, Default)]
pub struct NodeInputs {
    pub model: Option<InputValue>,
    pub temperature: Option<InputValue>,
    pub max_tokens: Option<InputValue>,
    pub top_p: Option<InputValue>,
    pub system_prompt: Option<InputValue>,
    pub prompt: Option<InputValue>,
    pub messages: Option<InputValue>,
}

impl NodeInputs {
    /// Inputs with only a prompt connected
    pub fn with_prompt(prompt: impl Into<InputValue>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            ..Self::default()
        }
    }

    /// Inputs with only a message list connected
    pub fn with_messages(messages: impl Into<InputValue>) -> Self {
        Self {
            messages: Some(messages.into()),
            ..Self::default()
        }
    }

    /// Collect inputs from values keyed by port id
    ///
    /// Values on ports the node does not declare are ignored.
    pub fn from_ports(mut values: HashMap<String, InputValue>) -> Self {
        let mut take = |id: &str| values.remove(id);
        Self {
            model: take(ports::MODEL),
            temperature: take(ports::TEMPERATURE),
            max_tokens: take(ports::MAX_TOKENS),
            top_p: take(ports::TOP_P),
            system_prompt: take(ports::SYSTEM_PROMPT),
            prompt: take(ports::PROMPT),
            messages: take(ports::MESSAGES),
        }
    }
}

/// The shapes a prompt input can take
#[derive(Debug, Clone, PartialEq)]
pub enum PromptInput {
    Message(ChatMessage),
    Messages(Vec<ChatMessage>),
    Text(String),
    Texts(Vec<String>),
    /// Any other value that still reads as text
    Coerced(String),
}

impl PromptInput {
    /// Classify a prompt value
    ///
    /// # Errors
    ///
    /// Returns `ChatError::InvalidInput` when the value neither matches a
    /// known shape nor coerces to text
    pub fn classify(value: &InputValue) -> Result<Self, ChatError> {
        match value {
            InputValue::ChatMessage(message) => Ok(Self::Message(message.clone())),
            InputValue::ChatMessageArray(messages) => Ok(Self::Messages(messages.clone())),
            InputValue::String(text) => Ok(Self::Text(text.clone())),
            InputValue::StringArray(texts) => Ok(Self::Texts(texts.clone())),
            other => other.coerce_to_text().map(Self::Coerced).ok_or_else(|| ChatError::InvalidInput {
                port: ports::PROMPT,
                reason: "could not be read as text or chat messages".to_owned(),
            }),
        }
    }

    /// Normalize into chat messages, text becoming user turns
    pub fn into_messages(self) -> Vec<ChatMessage> {
        match self {
            Self::Message(message) => vec![message],
            Self::Messages(messages) => messages,
            Self::Text(text) | Self::Coerced(text) => vec![ChatMessage::user(text)],
            Self::Texts(texts) => texts.into_iter().map(ChatMessage::user).collect(),
        }
    }
}

/// A request ready to send, with the host messages it was built from
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub request: CompletionRequest,
    pub messages: Vec<ChatMessage>,
}

/// Builds completion requests from node defaults and inputs
#[derive(Debug)]
pub struct RequestBuilder<'a> {
    defaults: &'a NodeConfig,
    credential: Option<&'a SecretString>,
}

impl<'a> RequestBuilder<'a> {
    pub const fn new(defaults: &'a NodeConfig, credential: Option<&'a SecretString>) -> Self {
        Self { defaults, credential }
    }

    /// Resolve every field and build the request
    ///
    /// # Errors
    ///
    /// Returns `ChatError::MissingCredential` without a credential and
    /// `ChatError::InvalidInput` for absent or unusable port values
    pub fn build(&self, inputs: &NodeInputs) -> Result<PreparedRequest, ChatError> {
        let credential = self.credential.cloned().ok_or(ChatError::MissingCredential)?;

        let model = match &inputs.model {
            Some(value) => value
                .coerce_to_text()
                .map(|m| m.trim().to_owned())
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| self.defaults.model.clone()),
            None => self.defaults.model.clone(),
        };
        let temperature = number_input(inputs.temperature.as_ref(), ports::TEMPERATURE)?
            .unwrap_or(self.defaults.temperature);
        let top_p = number_input(inputs.top_p.as_ref(), ports::TOP_P)?.unwrap_or(self.defaults.top_p);
        let max_tokens = max_tokens_input(inputs.max_tokens.as_ref())?.unwrap_or(self.defaults.max_tokens);

        let messages = if self.defaults.use_messages_input {
            let value = inputs.messages.as_ref().ok_or_else(|| ChatError::InvalidInput {
                port: ports::MESSAGES,
                reason: "is required".to_owned(),
            })?;
            value.coerce_to_messages().ok_or_else(|| ChatError::InvalidInput {
                port: ports::MESSAGES,
                reason: "could not be read as a list of chat messages".to_owned(),
            })?
        } else {
            let value = inputs.prompt.as_ref().ok_or_else(|| ChatError::InvalidInput {
                port: ports::PROMPT,
                reason: "is required".to_owned(),
            })?;
            let system_prompt = match &inputs.system_prompt {
                Some(value) => value.coerce_to_text().ok_or_else(|| ChatError::InvalidInput {
                    port: ports::SYSTEM_PROMPT,
                    reason: "could not be read as text".to_owned(),
                })?,
                None => self.defaults.system_prompt.clone(),
            };

            let mut messages = Vec::new();
            if !system_prompt.trim().is_empty() {
                messages.push(ChatMessage::system(system_prompt));
            }
            messages.extend(PromptInput::classify(value)?.into_messages());
            messages
        };

        tracing::debug!(model = %model, messages = messages.len(), "built completion request");

        let request = CompletionRequest {
            model,
            messages: messages.iter().map(to_wire_message).collect(),
            temperature,
            max_tokens,
            top_p,
            stream: self.defaults.stream,
            safe_prompt: self.defaults.safe_prompt,
            random_seed: self.defaults.random_seed,
            credential,
        };

        Ok(PreparedRequest { request, messages })
    }
}

fn number_input(value: Option<&InputValue>, port: &'static str) -> Result<Option<f64>, ChatError> {
    value
        .map(|v| {
            v.coerce_to_number()
                .filter(|n| n.is_finite())
                .ok_or_else(|| ChatError::InvalidInput {
                    port,
                    reason: "must be a number".to_owned(),
                })
        })
        .transpose()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn max_tokens_input(value: Option<&InputValue>) -> Result<Option<u32>, ChatError> {
    let Some(n) = number_input(value, ports::MAX_TOKENS)? else {
        return Ok(None);
    };

    if n < 1.0 || n > f64::from(u32::MAX) || n.fract() > 0.0 {
        return Err(ChatError::InvalidInput {
            port: ports::MAX_TOKENS,
            reason: format!("must be a positive whole number, got {n}"),
        });
    }

    Ok(Some(n as u32))
}
