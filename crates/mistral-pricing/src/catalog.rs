use mistral_core::Currency;
use serde::{Serialize, Serializer};

/// A price quoted in every supported currency
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurrencyPrice {
    /// Price in US dollars
    pub usd: f64,
    /// Price in euros
    pub eur: f64,
}

impl CurrencyPrice {
    /// Price in `currency`
    pub const fn get(&self, currency: Currency) -> f64 {
        match currency {
            Currency::Usd => self.usd,
            Currency::Eur => self.eur,
        }
    }
}

/// Per-million-token price for one side of a completion
///
/// Serializes `Unavailable` as `"-"`, the placeholder configuration UIs show.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Price {
    /// Priced per million tokens
    PerMillionTokens(CurrencyPrice),
    /// Not billed or not published
    Unavailable,
}

impl Price {
    /// Price in `currency`, if there is one
    pub const fn per_million(&self, currency: Currency) -> Option<f64> {
        match self {
            Self::PerMillionTokens(price) => Some(price.get(currency)),
            Self::Unavailable => None,
        }
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::PerMillionTokens(price) => price.serialize(serializer),
            Self::Unavailable => serializer.serialize_str("-"),
        }
    }
}

/// How a model is billed
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Pricing {
    /// Prompt and completion tokens priced separately
    Tokens {
        /// Prompt-side price
        prompt: Price,
        /// Completion-side price
        completion: Price,
    },
    /// Document models billed per processed page
    PerThousandPages {
        /// Price per thousand pages
        price: CurrencyPrice,
    },
}

/// Catalog entry for one model
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelInfo {
    /// Identifier sent in requests
    pub id: &'static str,
    /// Name shown in configuration UIs
    pub display_name: &'static str,
    /// Context window in tokens
    pub context_length: u32,
    /// Billing scheme
    pub pricing: Pricing,
}

impl ModelInfo {
    /// Neutral entry for ids missing from the catalog
    pub const UNKNOWN: Self = Self {
        id: "unknown",
        display_name: "Unknown model",
        context_length: 0,
        pricing: Pricing::Tokens {
            prompt: Price::Unavailable,
            completion: Price::Unavailable,
        },
    };
}

const fn tokens(prompt_usd: f64, prompt_eur: f64, completion_usd: f64, completion_eur: f64) -> Pricing {
    Pricing::Tokens {
        prompt: Price::PerMillionTokens(CurrencyPrice {
            usd: prompt_usd,
            eur: prompt_eur,
        }),
        completion: Price::PerMillionTokens(CurrencyPrice {
            usd: completion_usd,
            eur: completion_eur,
        }),
    }
}

const fn prompt_only(usd: f64, eur: f64) -> Pricing {
    Pricing::Tokens {
        prompt: Price::PerMillionTokens(CurrencyPrice { usd, eur }),
        completion: Price::Unavailable,
    }
}

const fn model(id: &'static str, display_name: &'static str, context_length: u32, pricing: Pricing) -> ModelInfo {
    ModelInfo {
        id,
        display_name,
        context_length,
        pricing,
    }
}

/// Every model the node offers, in the order configuration UIs list them
pub static MODELS: &[ModelInfo] = &[
    model("mistral-large-latest", "Mistral Large", 131_072, tokens(2.0, 1.8, 6.0, 5.4)),
    model("mistral-medium-latest", "Mistral Medium", 131_072, tokens(0.4, 0.36, 2.0, 1.8)),
    model("mistral-small-latest", "Mistral Small", 131_072, tokens(0.1, 0.09, 0.3, 0.27)),
    model("magistral-medium-latest", "Magistral Medium", 40_960, tokens(2.0, 1.8, 5.0, 4.5)),
    model("magistral-small-latest", "Magistral Small", 40_960, tokens(0.5, 0.45, 1.5, 1.35)),
    model("codestral-latest", "Codestral", 262_144, tokens(0.3, 0.27, 0.9, 0.81)),
    model("devstral-small-latest", "Devstral Small", 131_072, tokens(0.1, 0.09, 0.3, 0.27)),
    model("pixtral-large-latest", "Pixtral Large", 131_072, tokens(2.0, 1.8, 6.0, 5.4)),
    model("pixtral-12b-2409", "Pixtral 12B", 131_072, tokens(0.15, 0.135, 0.15, 0.135)),
    model("ministral-8b-latest", "Ministral 8B", 131_072, tokens(0.1, 0.09, 0.1, 0.09)),
    model("ministral-3b-latest", "Ministral 3B", 131_072, tokens(0.04, 0.036, 0.04, 0.036)),
    model("open-mistral-nemo", "Mistral NeMo", 131_072, tokens(0.15, 0.135, 0.15, 0.135)),
    model("mistral-saba-latest", "Mistral Saba", 32_768, tokens(0.2, 0.18, 0.6, 0.54)),
    model("mistral-embed", "Mistral Embed", 8_192, prompt_only(0.1, 0.09)),
    model("mistral-moderation-latest", "Mistral Moderation", 8_192, prompt_only(0.1, 0.09)),
    model(
        "mistral-ocr-latest",
        "Mistral OCR",
        0,
        Pricing::PerThousandPages {
            price: CurrencyPrice { usd: 1.0, eur: 0.9 },
        },
    ),
];

/// Look up a catalog entry by model id
pub fn find_model(id: &str) -> Option<&'static ModelInfo> {
    MODELS.iter().find(|m| m.id == id)
}

/// Look up a catalog entry, falling back to [`ModelInfo::UNKNOWN`]
pub fn model_or_placeholder(id: &str) -> &'static ModelInfo {
    find_model(id).unwrap_or_else(|| {
        tracing::debug!(model = id, "model not in catalog, using placeholder");
        &ModelInfo::UNKNOWN
    })
}
