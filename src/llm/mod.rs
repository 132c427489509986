//! Move-suggestion service clients.
//!
//! - [`providers`]: the [`LlmProvider`] trait and its Gemini, OpenAI-compatible
//!   and Anthropic implementations.
//! - [`types`]: request shape and error taxonomy.

pub mod providers;
pub mod types;

pub use providers::{LlmProvider, create_provider, provider_from_config};
pub use types::{LlmError, LlmRequest};
