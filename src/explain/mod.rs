//! Human-readable reasons for a recommendation: language-model text when a
//! provider is configured, a fixed template otherwise.

pub mod ai;
pub mod template;

pub use ai::explain_recommendations;
pub use template::{chat_reply, deterministic_explanation, format_amount, match_reasons};
