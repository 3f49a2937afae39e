//! Completion-model configuration loaded strictly from environment variables.
//!
//! # Environment variables
//!
//! Mandatory:
//! - `YANDEX_CLOUD_API_KEY`    = API key for the completion service
//! - `YANDEX_CLOUD_FOLDER_ID`  = cloud folder that owns the model
//! - `YANDEX_CLOUD_MODEL_NAME` = model identifier (e.g. `yandexgpt-lite`)
//!
//! Optional:
//! - `YANDEX_CLOUD_API_ENDPOINT` = API base URL (defaults to the public one)
//! - `LLM_MAX_TOKENS`            = generation budget (defaults to 1500)
//!
//! Missing mandatory variables are collected and reported together via
//! [`ConfigError::MissingVars`] so a broken environment fails fast with the
//! complete list instead of one variable at a time.

use crate::error_handler::{AiLlmError, ConfigError, env_opt, env_opt_u32};

/// Public endpoint of the Yandex Cloud foundation-models API.
pub const DEFAULT_ENDPOINT: &str = "https://llm.api.cloud.yandex.net";

const DEFAULT_MAX_TOKENS: u32 = 1500;
const DEFAULT_TEMPERATURE: f32 = 0.2;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Configuration for the Yandex Cloud completion model.
#[derive(Debug, Clone)]
pub struct YandexGptConfig {
    /// API key used in the `Authorization: Api-Key ...` header.
    pub api_key: String,

    /// Cloud folder identifier; part of the model URI and the
    /// `x-folder-id` header.
    pub folder_id: String,

    /// Model identifier string (e.g. `yandexgpt`, `yandexgpt-lite`).
    pub model_name: String,

    /// API base URL.
    pub endpoint: String,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sampling temperature (lower = more deterministic).
    pub temperature: Option<f32>,

    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl YandexGptConfig {
    /// Reads the full configuration from the environment.
    ///
    /// # Errors
    /// - [`ConfigError::MissingVars`] naming every absent mandatory variable
    /// - [`ConfigError::InvalidNumber`] if `LLM_MAX_TOKENS` is not a `u32`
    /// - [`ConfigError::InvalidFormat`] if the endpoint override has no
    ///   http/https scheme
    pub fn from_env() -> Result<Self, AiLlmError> {
        let mut missing: Vec<&'static str> = Vec::new();

        let api_key = env_opt("YANDEX_CLOUD_API_KEY")
            .unwrap_or_else(|| {
                missing.push("YANDEX_CLOUD_API_KEY");
                String::new()
            });
        let folder_id = env_opt("YANDEX_CLOUD_FOLDER_ID")
            .unwrap_or_else(|| {
                missing.push("YANDEX_CLOUD_FOLDER_ID");
                String::new()
            });
        let model_name = env_opt("YANDEX_CLOUD_MODEL_NAME")
            .unwrap_or_else(|| {
                missing.push("YANDEX_CLOUD_MODEL_NAME");
                String::new()
            });

        if !missing.is_empty() {
            return Err(ConfigError::MissingVars(missing).into());
        }

        let endpoint =
            env_opt("YANDEX_CLOUD_API_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::InvalidFormat {
                var: "YANDEX_CLOUD_API_ENDPOINT",
                reason: "must start with http:// or https://",
            }
            .into());
        }

        let max_tokens = env_opt_u32("LLM_MAX_TOKENS")?.or(Some(DEFAULT_MAX_TOKENS));

        Ok(Self {
            api_key,
            folder_id,
            model_name,
            endpoint,
            max_tokens,
            temperature: Some(DEFAULT_TEMPERATURE),
            timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Full model URI understood by the completion endpoint.
    pub fn model_uri(&self) -> String {
        format!("gpt://{}/{}/latest", self.folder_id, self.model_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_uri_combines_folder_and_model() {
        let cfg = YandexGptConfig {
            api_key: "key".into(),
            folder_id: "b1gfolder".into(),
            model_name: "yandexgpt-lite".into(),
            endpoint: DEFAULT_ENDPOINT.into(),
            max_tokens: Some(1500),
            temperature: Some(0.2),
            timeout_secs: Some(60),
        };
        assert_eq!(cfg.model_uri(), "gpt://b1gfolder/yandexgpt-lite/latest");
    }
}
