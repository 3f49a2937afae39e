//! Shared completion-model service for the Yandex Cloud foundation-models API.
//!
//! - Construct the config once at process start ([`YandexGptConfig::from_env`]),
//!   wrap the service in `Arc`, and pass clones to dependents.
//! - [`YandexGptService::complete`] performs a single non-streaming completion
//!   request and returns the ordered list of alternatives.
//! - Errors are unified under [`AiLlmError`]; transport, provider and
//!   configuration failures stay distinguishable for callers that embed them
//!   into per-unit results.

pub mod config;
pub mod error_handler;
pub mod services;

pub use config::yandex_gpt_config::YandexGptConfig;
pub use error_handler::{AiLlmError, ConfigError, ProviderError};
pub use services::yandex_gpt_service::{CompletionAlternative, CompletionReply, YandexGptService};
