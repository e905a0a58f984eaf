//! Translation API interaction with exponential backoff retry logic.
//!
//! This module provides the interface to the external translation model, an
//! OpenAI-compatible chat-completions endpoint. It includes automatic retry
//! logic with exponential backoff and jitter to ride out transient failures.
//!
//! # Architecture
//!
//! The module uses a trait-based design for flexibility:
//! - [`AskAsync`]: Core trait defining one async model call
//! - [`ChatTranslator`]: Sends text to the chat-completions endpoint
//! - [`RetryAsk`]: Decorator that adds retry logic to any `AskAsync` implementation
//!
//! Retries are bounded by a [`RetryPolicy`]; the per-call timeout lives on
//! the HTTP client. What the caller does once retries are exhausted is up to
//! the caller (see [`crate::enrich`], which falls back to the original text).

use std::fmt;
use std::time::{Duration, Instant};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{error, instrument, warn};

use crate::error::{PipelineError, Result};
use crate::retry::RetryPolicy;
use crate::utils::truncate_for_log;

/// Domain framing sent with every translation request.
pub const TRANSLATION_INSTRUCTION: &str = "You translate content for a bilingual \
(Spanish/English) student science journal. Detect whether the text is written in \
Spanish or English and translate it into the other language. Keep HTML tags, \
scientific names, formulas and proper nouns unchanged. Reply with a single JSON \
object and nothing else, of the form {\"es\": \"<Spanish text>\", \"en\": \"<English text>\"}.";

/// Trait for one async model interaction.
///
/// Implementors send text to a model and return its raw reply. This
/// abstraction allows for different backends, decorators (like retry
/// logic) and fixed stubs in tests.
pub trait AskAsync {
    /// The type of response returned by the model.
    type Response;

    /// Send text to the model and receive a response.
    async fn ask(&self, text: &str) -> Result<Self::Response>;
}

impl<T: AskAsync> AskAsync for &T {
    type Response = T::Response;

    async fn ask(&self, text: &str) -> Result<Self::Response> {
        (**self).ask(text).await
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`AskAsync`] implementation.
pub struct RetryAsk<T> {
    /// The underlying client to wrap.
    inner: T,
    policy: RetryPolicy,
}

impl<T> RetryAsk<T>
where
    T: AskAsync,
{
    /// Create a new retry wrapper around an existing [`AskAsync`] implementation.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let client = ChatTranslator::new(http, endpoint, api_key, model);
    /// let retry_client = RetryAsk::new(client, RetryPolicy::new(2, Duration::from_secs(1)));
    /// ```
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk")
            .field("max_retries", &self.policy.max_retries)
            .field("base_delay", &self.policy.base_delay)
            .field("max_delay", &self.policy.max_delay)
            .finish()
    }
}

impl<T> AskAsync for RetryAsk<T>
where
    T: AskAsync,
{
    type Response = T::Response;

    #[instrument(level = "debug", skip_all)]
    async fn ask(&self, text: &str) -> Result<Self::Response> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.ask(text).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if !self.policy.should_retry(attempt) {
                        error!(
                            attempt,
                            max = self.policy.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                            elapsed_ms_total = total_dt.as_millis() as u64,
                            error = %e,
                            "ask() exhausted retries"
                        );
                        return Err(e);
                    }

                    let delay = self.policy.backoff(attempt);
                    warn!(
                        attempt,
                        max = self.policy.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                        elapsed_ms_total = total_dt.as_millis() as u64,
                        ?delay,
                        error = %e,
                        "ask() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat-completions endpoint.
///
/// Each call sends [`TRANSLATION_INSTRUCTION`] as the system message and the
/// text as the user message, and returns the reply content unparsed.
pub struct ChatTranslator {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl ChatTranslator {
    pub fn new(
        client: Client,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Build a client whose every call is bounded by `timeout`.
    pub fn with_timeout(
        timeout: Duration,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::new(client, endpoint, api_key, model))
    }
}

impl fmt::Debug for ChatTranslator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatTranslator")
            .field("client", &"<reqwest::Client>")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .finish()
    }
}

impl AskAsync for ChatTranslator {
    type Response = String;

    #[instrument(level = "debug", skip_all, fields(chars = text.chars().count()))]
    async fn ask(&self, text: &str) -> Result<Self::Response> {
        let t0 = Instant::now();
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: TRANSLATION_INSTRUCTION,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            temperature: 0.0,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::Translation(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                elapsed_ms = t0.elapsed().as_millis() as u64,
                %status,
                "Translation API returned an error status"
            );
            return Err(PipelineError::Translation(format!(
                "HTTP {status}: {}",
                truncate_for_log(&body, 200)
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::Translation(format!("invalid response body: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| PipelineError::Translation("response has no message content".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug)]
    struct Flaky {
        calls: AtomicUsize,
        failures: usize,
    }

    impl AskAsync for Flaky {
        type Response = String;

        async fn ask(&self, text: &str) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(PipelineError::Translation("rate limited".into()))
            } else {
                Ok(text.to_uppercase())
            }
        }
    }

    fn fast_policy(max_retries: usize) -> RetryPolicy {
        RetryPolicy::new(max_retries, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn retry_recovers_from_transient_failures() {
        let flaky = Flaky {
            calls: AtomicUsize::new(0),
            failures: 2,
        };
        let api = RetryAsk::new(&flaky, fast_policy(2));
        assert_eq!(api.ask("hola").await.unwrap(), "HOLA");
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retry_gives_up_after_budget() {
        let flaky = Flaky {
            calls: AtomicUsize::new(0),
            failures: 10,
        };
        let api = RetryAsk::new(&flaky, fast_policy(1));
        assert!(api.ask("hola").await.is_err());
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn chat_translator_returns_message_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "{\"es\":\"Hola\",\"en\":\"Hello\"}"}}]
            })))
            .mount(&server)
            .await;

        let translator = ChatTranslator::with_timeout(
            Duration::from_secs(5),
            format!("{}/v1/chat/completions", server.uri()),
            "test-key",
            "test-model",
        )
        .unwrap();
        let reply = translator.ask("Hola").await.unwrap();
        assert_eq!(reply, r#"{"es":"Hola","en":"Hello"}"#);
    }

    #[tokio::test]
    async fn chat_translator_maps_quota_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let translator = ChatTranslator::with_timeout(
            Duration::from_secs(5),
            format!("{}/v1/chat/completions", server.uri()),
            "test-key",
            "test-model",
        )
        .unwrap();
        let err = translator.ask("Hola").await.unwrap_err();
        assert!(matches!(err, PipelineError::Translation(_)));
        assert!(err.to_string().contains("429"));
    }

    #[test]
    fn debug_redacts_api_key() {
        let translator = ChatTranslator::new(Client::new(), "http://x", "secret", "m");
        assert!(!format!("{translator:?}").contains("secret"));
    }
}
