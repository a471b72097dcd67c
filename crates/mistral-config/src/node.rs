use mistral_core::Currency;
use serde::Deserialize;

/// Per-node defaults
///
/// Each sampling field is the value used when the matching input port is
/// not connected for an invocation.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Nucleus sampling threshold
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    /// System prompt prepended in prompt mode
    #[serde(default)]
    pub system_prompt: String,
    /// Take a pre-built message list instead of a prompt
    #[serde(default)]
    pub use_messages_input: bool,
    /// Request a streamed response
    #[serde(default = "default_true")]
    pub stream: bool,
    /// Ask the endpoint to inject its safety prompt
    #[serde(default)]
    pub safe_prompt: bool,
    /// Seed for deterministic sampling
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Surface partial outputs to the containing graph
    #[serde(default = "default_true")]
    pub partial_output: bool,
    /// Currency used for cost figures
    #[serde(default)]
    pub currency: Currency,
    /// Reuse cached outputs for identical requests
    #[serde(default)]
    pub cache: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            top_p: default_top_p(),
            system_prompt: String::new(),
            use_messages_input: false,
            stream: true,
            safe_prompt: false,
            random_seed: None,
            partial_output: true,
            currency: Currency::default(),
            cache: false,
        }
    }
}

impl NodeConfig {
    /// Check value ranges accepted by the endpoint
    ///
    /// # Errors
    ///
    /// Returns a description of the first out-of-range field
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("node.model must not be empty".to_owned());
        }
        if !(0.0..=1.5).contains(&self.temperature) {
            return Err(format!("node.temperature must be within 0.0..=1.5, got {}", self.temperature));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(format!("node.top_p must be within 0.0..=1.0, got {}", self.top_p));
        }
        if self.max_tokens == 0 {
            return Err("node.max_tokens must be greater than zero".to_owned());
        }
        Ok(())
    }
}

fn default_model() -> String {
    "mistral-small-latest".to_owned()
}

const fn default_temperature() -> f64 {
    0.7
}

const fn default_max_tokens() -> u32 {
    1024
}

const fn default_top_p() -> f64 {
    1.0
}

const fn default_true() -> bool {
    true
}
