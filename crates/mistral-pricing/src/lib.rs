//! Mistral model catalog and completion cost estimation
//!
//! The catalog is static data consumed by configuration UIs (display names,
//! context lengths) and by [`estimate_cost`]. Unknown model ids never fail;
//! they resolve to a neutral placeholder that prices everything at zero.

#![allow(clippy::must_use_candidate)]

pub mod catalog;
pub mod cost;

pub use catalog::{CurrencyPrice, MODELS, ModelInfo, Price, Pricing, find_model, model_or_placeholder};
pub use cost::{estimate_cost, token_cost_cents};
