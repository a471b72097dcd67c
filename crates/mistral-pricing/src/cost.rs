//! Completion cost estimation
//!
//! Costs are reported in cents (hundredths of the currency's major unit)
//! rounded to four decimal places, not two: small completions cost
//! fractions of a cent and downstream consumers sum them.

use mistral_core::{CostEstimate, Currency, TokenUsage};

use crate::catalog::{Pricing, model_or_placeholder};

const TOKENS_PER_PRICE_UNIT: f64 = 1_000_000.0;

/// Estimate the cost of a completion
///
/// Unknown models and unavailable prices contribute zero. Page-priced
/// models bypass the token formula entirely.
pub fn estimate_cost(model_id: &str, usage: &TokenUsage, currency: Currency) -> CostEstimate {
    let info = model_or_placeholder(model_id);

    let cents = match info.pricing {
        Pricing::Tokens { prompt, completion } => token_cost_cents(
            usage.prompt_tokens,
            usage.completion_tokens,
            prompt.per_million(currency),
            completion.per_million(currency),
        ),
        Pricing::PerThousandPages { .. } => page_cost_cents(model_id),
    };

    CostEstimate { cents, currency }
}

/// Token-priced cost in cents
///
/// `None` prices count as zero for their side of the completion.
pub fn token_cost_cents(
    prompt_tokens: u32,
    completion_tokens: u32,
    prompt_per_million: Option<f64>,
    completion_per_million: Option<f64>,
) -> f64 {
    let prompt = f64::from(prompt_tokens) / TOKENS_PER_PRICE_UNIT * prompt_per_million.unwrap_or(0.0);
    let completion = f64::from(completion_tokens) / TOKENS_PER_PRICE_UNIT * completion_per_million.unwrap_or(0.0);

    round_to_4dp((prompt + completion) * 100.0)
}

/// Page-priced models report no token-derived cost
///
/// Page counts are not part of a chat completion response, so there is
/// nothing to price here yet.
fn page_cost_cents(model_id: &str) -> f64 {
    tracing::debug!(model = model_id, "page-priced model, reporting zero cost");
    0.0
}

fn round_to_4dp(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
