//! Generic chat driver
//!
//! [`ChatModel`] owns the parts every backend shares: history bookkeeping,
//! the retry loop, HTTP status handling and response parsing. A
//! [`ChatDialect`] supplies only what differs between vendors: the URL, the
//! authentication and the request/response shapes.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use domain::{ConversationHistory, ConversationMessage};
use infrastructure::http::{build_client, snippet};
use infrastructure::{RetryPolicy, with_retry};

use crate::config::InferenceConfig;
use crate::error::InferenceError;
use crate::ports::LanguageModel;

/// Vendor-specific half of a chat backend
pub trait ChatDialect: Send + Sync {
    /// Request body
    type Request: Serialize + Send + Sync;
    /// Response body
    type Response: DeserializeOwned + Send;

    /// Short name used in logs and errors
    fn name(&self) -> &'static str;

    /// Full URL of the chat endpoint
    fn endpoint(&self, config: &InferenceConfig) -> String;

    /// Attach credentials to a request
    ///
    /// The default sends the key as a bearer token.
    fn authorize(&self, request: RequestBuilder, api_key: Option<&str>) -> RequestBuilder {
        match api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// Build the request body from the full conversation
    fn build_request(
        &self,
        messages: &[ConversationMessage],
        config: &InferenceConfig,
    ) -> Self::Request;

    /// Pull the reply text out of a response, `None` if absent
    fn extract_reply(&self, response: Self::Response) -> Option<String>;
}

/// Language model driven by a [`ChatDialect`]
pub struct ChatModel<D> {
    client: Client,
    config: InferenceConfig,
    policy: RetryPolicy,
    endpoint: String,
    dialect: D,
}

impl<D: ChatDialect> std::fmt::Debug for ChatModel<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatModel")
            .field("dialect", &self.dialect.name())
            .field("endpoint", &self.endpoint)
            .field("model", &self.config.resolved_model())
            .finish_non_exhaustive()
    }
}

impl<D: ChatDialect> ChatModel<D> {
    /// Validate the configuration and build the HTTP client
    ///
    /// Fails without touching the network when the configuration is invalid,
    /// including a missing API key.
    pub fn new(config: InferenceConfig, dialect: D) -> Result<Self, InferenceError> {
        config.validate().map_err(InferenceError::Configuration)?;

        let client = build_client(config.timeout_ms)
            .map_err(|e| InferenceError::Configuration(e.to_string()))?;
        let endpoint = dialect.endpoint(&config);
        let policy = config.retry_policy();

        info!(
            provider = dialect.name(),
            model = %config.resolved_model(),
            max_attempts = policy.max_attempts,
            "Initialized chat model"
        );

        Ok(Self {
            client,
            config,
            policy,
            endpoint,
            dialect,
        })
    }

    /// Endpoint the model posts to
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The configuration in use
    #[must_use]
    pub const fn config(&self) -> &InferenceConfig {
        &self.config
    }

    async fn request_once(&self, body: &D::Request) -> Result<String, InferenceError> {
        let request = self.client.post(&self.endpoint).json(body);
        let response = self
            .dialect
            .authorize(request, self.config.api_key())
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            warn!(
                provider = self.dialect.name(),
                status = %status,
                body = %snippet(&text),
                "Chat request failed"
            );
            return Err(InferenceError::from_status(status, &text));
        }

        let parsed: D::Response = serde_json::from_str(&text).map_err(|e| {
            InferenceError::InvalidResponse(format!(
                "{} response could not be parsed ({e}): {}",
                self.dialect.name(),
                snippet(&text)
            ))
        })?;

        self.dialect.extract_reply(parsed).ok_or_else(|| {
            InferenceError::InvalidResponse(format!(
                "{} response carried no reply: {}",
                self.dialect.name(),
                snippet(&text)
            ))
        })
    }
}

#[async_trait]
impl<D: ChatDialect> LanguageModel for ChatModel<D> {
    #[instrument(
        skip(self, history, user_text),
        fields(provider = self.dialect.name(), model = %self.config.resolved_model())
    )]
    async fn converse(
        &self,
        history: &mut ConversationHistory,
        user_text: &str,
    ) -> Result<String, InferenceError> {
        let user_text = user_text.trim();
        if user_text.is_empty() {
            return Err(InferenceError::Validation(
                "message must not be empty".to_string(),
            ));
        }

        history.push_user(user_text);
        let body = self.dialect.build_request(history.messages(), &self.config);

        let outcome = with_retry(&self.policy, || self.request_once(&body)).await;
        debug!(
            attempts = outcome.attempts,
            duration_ms = u64::try_from(outcome.total_duration.as_millis()).unwrap_or(u64::MAX),
            "Chat request finished"
        );

        let reply = outcome.into_result()?.trim().to_string();
        history.push_assistant(reply.clone());

        debug!(history_len = history.len(), reply_len = reply.len(), "Conversation advanced");
        Ok(reply)
    }

    fn model_name(&self) -> &str {
        self.config.resolved_model()
    }
}
