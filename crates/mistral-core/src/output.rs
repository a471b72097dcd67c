use serde::{Deserialize, Serialize};

use crate::message::ChatMessage;

/// Currency a cost figure is expressed in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    /// US dollars
    #[default]
    Usd,
    /// Euros
    Eur,
}

impl Currency {
    /// ISO 4217 code
    pub const fn code(self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
        }
    }
}

/// Token accounting for one completion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens consumed by the prompt
    pub prompt_tokens: u32,
    /// Tokens generated in the completion
    pub completion_tokens: u32,
    /// Prompt plus completion
    pub total_tokens: u32,
}

/// Cost of a completion in hundredths of the currency's major unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    /// Cost in cents, rounded to four decimal places
    pub cents: f64,
    /// Currency the cents belong to
    pub currency: Currency,
}

/// Usage and cost attached to a final output
///
/// `Exact` figures come from the endpoint; `Estimated` ones were derived
/// from the response length because the endpoint never reported usage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UsageDetail {
    /// Usage reported by the endpoint
    Exact {
        /// Token counts
        usage: TokenUsage,
        /// Cost derived from the counts
        cost: CostEstimate,
    },
    /// Usage estimated locally
    Estimated {
        /// Token counts
        usage: TokenUsage,
        /// Cost derived from the counts
        cost: CostEstimate,
    },
}

impl UsageDetail {
    /// Token counts regardless of provenance
    pub const fn usage(&self) -> &TokenUsage {
        match self {
            Self::Exact { usage, .. } | Self::Estimated { usage, .. } => usage,
        }
    }

    /// Cost regardless of provenance
    pub const fn cost(&self) -> &CostEstimate {
        match self {
            Self::Exact { cost, .. } | Self::Estimated { cost, .. } => cost,
        }
    }

    /// Whether the figures are a local estimate
    pub const fn is_estimate(&self) -> bool {
        matches!(self, Self::Estimated { .. })
    }
}

/// Values the node places on its output ports
///
/// Partial emissions and the final result share this shape; partials carry
/// no usage detail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeOutput {
    /// Generated text so far
    pub response: String,
    /// The trailing assistant message
    pub message: ChatMessage,
    /// Request messages followed by the assistant message
    pub all_messages: Vec<ChatMessage>,
    /// Usage and cost, present on the final output only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageDetail>,
    /// Last finish reason reported by the endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}
