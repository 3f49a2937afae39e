//! Yandex Cloud foundation-models service for text completion.
//!
//! Minimal, non-streaming client around the REST API:
//! - POST {endpoint}/foundationModels/v1/completion   (non-streaming)
//!
//! Constructor validation:
//! - `cfg.api_key` must be non-empty
//! - `cfg.endpoint` must start with http:// or https://
//!
//! Errors are normalized via unified error types in `error_handler`. A reply
//! with zero alternatives is reported as [`ProviderError::EmptyAlternatives`],
//! never as an empty success.

use std::borrow::Cow;
use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::{
    config::yandex_gpt_config::YandexGptConfig,
    error_handler::{AiLlmError, ProviderError, make_snippet},
};

/// Hard cap on prompt size. The assembled prompt is truncated to this many
/// characters immediately before the send, so the instruction template stays
/// intact and only the trailing diff payload is cut.
pub const MAX_PROMPT_CHARS: usize = 32_000;

/// Thin client for the Yandex Cloud completion API.
///
/// Constructed from a complete [`YandexGptConfig`]. Internally keeps a
/// preconfigured `reqwest::Client` (timeout and default headers).
#[derive(Debug)]
pub struct YandexGptService {
    client: reqwest::Client,
    cfg: YandexGptConfig,
    url_completion: String,
    model_uri: String,
}

/// One candidate completion returned by the provider.
#[derive(Debug, Clone)]
pub struct CompletionAlternative {
    /// Generated text payload.
    pub text: String,
    /// Provider-reported generation status, when present.
    pub status: Option<String>,
}

/// Successful completion reply: a non-empty ordered list of alternatives.
#[derive(Debug, Clone)]
pub struct CompletionReply {
    pub alternatives: Vec<CompletionAlternative>,
    pub model_version: Option<String>,
}

impl YandexGptService {
    /// Creates a new [`YandexGptService`] from the given config.
    ///
    /// # Errors
    /// - [`ProviderError::MissingApiKey`] if the API key is empty
    /// - [`ProviderError::InvalidEndpoint`] if the endpoint scheme is invalid
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: YandexGptConfig) -> Result<Self, AiLlmError> {
        if cfg.api_key.trim().is_empty() {
            return Err(ProviderError::MissingApiKey.into());
        }

        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ProviderError::InvalidEndpoint(cfg.endpoint.clone()).into());
        }

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Api-Key {}", cfg.api_key)).map_err(|e| {
                ProviderError::Decode(format!("invalid API key header: {e}"))
            })?,
        );
        headers.insert(
            "x-folder-id",
            header::HeaderValue::from_str(&cfg.folder_id).map_err(|e| {
                ProviderError::Decode(format!("invalid folder id header: {e}"))
            })?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let base = endpoint.trim_end_matches('/').to_string();
        let url_completion = format!("{}/foundationModels/v1/completion", base);
        let model_uri = cfg.model_uri();

        info!(
            model = %cfg.model_name,
            endpoint = %cfg.endpoint,
            timeout_secs = cfg.timeout_secs.unwrap_or(60),
            "YandexGptService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_completion,
            model_uri,
        })
    }

    /// Performs a **non-streaming** completion request.
    ///
    /// The messages array is an optional system instruction followed by the
    /// user prompt. Mapped options from config: `temperature`, `max_tokens`.
    ///
    /// # Errors
    /// - [`ProviderError::HttpStatus`] for non-2xx responses
    /// - [`AiLlmError::HttpTransport`] for client/network failures and timeouts
    /// - [`ProviderError::Decode`] if the JSON cannot be parsed
    /// - [`ProviderError::EmptyAlternatives`] if no alternatives are returned
    pub async fn complete(
        &self,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<CompletionReply, AiLlmError> {
        let started = Instant::now();
        let prompt = truncate_prompt(prompt);
        let body = CompletionRequest::from_cfg(&self.cfg, &self.model_uri, &prompt, system);

        debug!(
            model = %self.cfg.model_name,
            prompt_len = prompt.len(),
            has_system = system.is_some(),
            "POST {}", self.url_completion
        );

        let resp = self
            .client
            .post(&self.url_completion)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_completion.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            error!(
                %status,
                %url,
                %snippet,
                model = %self.cfg.model_name,
                latency_ms = started.elapsed().as_millis(),
                "completion endpoint returned non-success status"
            );

            return Err(ProviderError::HttpStatus {
                status,
                url,
                snippet,
            }
            .into());
        }

        let out: CompletionResponse = match resp.json().await {
            Ok(v) => v,
            Err(e) => {
                error!(
                    error = %e,
                    model = %self.cfg.model_name,
                    latency_ms = started.elapsed().as_millis(),
                    "failed to decode completion response"
                );
                return Err(ProviderError::Decode(format!(
                    "serde error: {e}; expected `result.alternatives[*].message.text`"
                ))
                .into());
            }
        };

        let alternatives: Vec<CompletionAlternative> = out
            .result
            .alternatives
            .into_iter()
            .map(|alt| CompletionAlternative {
                text: alt.message.text.unwrap_or_default(),
                status: alt.status,
            })
            .collect();

        if alternatives.is_empty() {
            warn!("completion reply contained no alternatives");
            return Err(ProviderError::EmptyAlternatives.into());
        }

        info!(
            model = %self.cfg.model_name,
            alternatives = alternatives.len(),
            latency_ms = started.elapsed().as_millis(),
            "completion request completed"
        );

        Ok(CompletionReply {
            alternatives,
            model_version: out.result.model_version,
        })
    }
}

/// Cuts an over-long prompt down to [`MAX_PROMPT_CHARS`] characters.
fn truncate_prompt(prompt: &str) -> Cow<'_, str> {
    if prompt.chars().count() <= MAX_PROMPT_CHARS {
        return Cow::Borrowed(prompt);
    }
    warn!(
        "prompt too long ({} chars), truncating to {} chars",
        prompt.chars().count(),
        MAX_PROMPT_CHARS
    );
    Cow::Owned(prompt.chars().take(MAX_PROMPT_CHARS).collect())
}

/* ===========================================================================
HTTP payloads & options
======================================================================== */

/// Request body for `/foundationModels/v1/completion` (non-streaming).
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    #[serde(rename = "modelUri")]
    model_uri: &'a str,
    #[serde(rename = "completionOptions")]
    completion_options: CompletionOptions,
    messages: Vec<Message<'a>>,
}

impl<'a> CompletionRequest<'a> {
    /// Builds a minimal completion request from config, `prompt`, and an
    /// optional system instruction.
    fn from_cfg(
        cfg: &YandexGptConfig,
        model_uri: &'a str,
        prompt: &'a str,
        system: Option<&'a str>,
    ) -> Self {
        let mut messages = Vec::with_capacity(2);
        if let Some(sys) = system {
            messages.push(Message {
                role: "system",
                text: sys,
            });
        }
        messages.push(Message {
            role: "user",
            text: prompt,
        });

        Self {
            model_uri,
            completion_options: CompletionOptions {
                stream: false,
                temperature: cfg.temperature,
                // int64 fields travel as JSON strings in this API.
                max_tokens: cfg.max_tokens.map(|v| v.to_string()),
            },
            messages,
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionOptions {
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(rename = "maxTokens", skip_serializing_if = "Option::is_none")]
    max_tokens: Option<String>,
}

/// Chat-style message for the completion API.
#[derive(Debug, Serialize)]
struct Message<'a> {
    /// One of: "system" | "user" | "assistant".
    role: &'a str,
    text: &'a str,
}

/// Minimal response shape (subset of fields we actually use).
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    result: CompletionResult,
}

#[derive(Debug, Deserialize)]
struct CompletionResult {
    #[serde(default)]
    alternatives: Vec<AlternativeOut>,
    #[serde(rename = "modelVersion", default)]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AlternativeOut {
    message: MessageOut,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageOut {
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cfg() -> YandexGptConfig {
        YandexGptConfig {
            api_key: "key".into(),
            folder_id: "b1gfolder".into(),
            model_name: "yandexgpt-lite".into(),
            endpoint: "https://llm.api.cloud.yandex.net".into(),
            max_tokens: Some(1500),
            temperature: Some(0.2),
            timeout_secs: Some(60),
        }
    }

    #[test]
    fn request_payload_uses_api_field_names() {
        let cfg = test_cfg();
        let model_uri = cfg.model_uri();
        let body = CompletionRequest::from_cfg(&cfg, &model_uri, "review this", Some("be strict"));
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["modelUri"], "gpt://b1gfolder/yandexgpt-lite/latest");
        assert_eq!(json["completionOptions"]["stream"], false);
        assert_eq!(json["completionOptions"]["maxTokens"], "1500");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["text"], "review this");
    }

    #[test]
    fn response_alternatives_decode() {
        let raw = r#"{
            "result": {
                "alternatives": [
                    {"message": {"role": "assistant", "text": "looks fine"}, "status": "ALTERNATIVE_STATUS_FINAL"}
                ],
                "usage": {"inputTextTokens": "10", "completionTokens": "3", "totalTokens": "13"},
                "modelVersion": "18.01.2025"
            }
        }"#;
        let out: CompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(out.result.alternatives.len(), 1);
        assert_eq!(
            out.result.alternatives[0].message.text.as_deref(),
            Some("looks fine")
        );
        assert_eq!(out.result.model_version.as_deref(), Some("18.01.2025"));
    }

    #[test]
    fn prompt_is_truncated_at_the_char_budget() {
        let long = "x".repeat(MAX_PROMPT_CHARS + 100);
        let cut = truncate_prompt(&long);
        assert_eq!(cut.chars().count(), MAX_PROMPT_CHARS);

        let short = "short prompt";
        assert!(matches!(truncate_prompt(short), Cow::Borrowed(_)));
    }

    #[test]
    fn new_rejects_bad_endpoint_and_empty_key() {
        let mut cfg = test_cfg();
        cfg.endpoint = "ftp://wrong".into();
        assert!(YandexGptService::new(cfg).is_err());

        let mut cfg = test_cfg();
        cfg.api_key = "  ".into();
        assert!(YandexGptService::new(cfg).is_err());
    }
}
