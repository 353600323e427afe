//! The resilient request gateway.
//!
//! Every outbound call flows through one pipeline: inject the bearer
//! credential, enforce the per-attempt deadline, classify the failure,
//! retry transient failures with jittered exponential backoff, and
//! optionally collapse concurrent duplicates onto one in-flight request.

pub mod auth;
pub mod classify;
pub mod dedup;
pub mod retry;

use crate::gateway::auth::TokenProvider;
use crate::gateway::dedup::DedupRegistry;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Method, Response};
use sanctum_types::models::{ErrorEnvelope, FunctionEnvelope, GatewayConfig, RetryConfig};
use sanctum_types::TypedError;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, warn};
use validator::Validate;

/// Result of a fully processed gateway call.
pub type Outcome = Result<Value, TypedError>;

/// Resilient front door for all outbound backend traffic.
pub struct Gateway {
    http: Client,
    config: GatewayConfig,
    tokens: Arc<dyn TokenProvider>,
    dedup: DedupRegistry<Outcome>,
}

// Manual impl: `tokens` and `dedup` hold non-Debug types.
impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway").field("config", &self.config).finish_non_exhaustive()
    }
}

impl Gateway {
    /// Build a gateway from a validated configuration.
    pub fn new(config: GatewayConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self, TypedError> {
        config
            .validate()
            .map_err(|e| TypedError::validation(format!("invalid gateway config: {e}")))?;
        for base in [&config.functions_base_url, &config.api_base_url] {
            url::Url::parse(base)
                .map_err(|e| TypedError::validation(format!("invalid base URL '{base}': {e}")))?;
        }

        // The client-level timeout applies to each send(), which gives every
        // retry attempt its own full deadline.
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| TypedError::unknown(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config, tokens, dedup: DedupRegistry::new() })
    }

    /// Build a gateway from environment-derived configuration.
    pub fn from_env(tokens: Arc<dyn TokenProvider>) -> Result<Self, TypedError> {
        Self::new(GatewayConfig::from_env(), tokens)
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// POST a payload to a named backend function.
    pub async fn call_function(&self, name: &str, payload: Value) -> Outcome {
        self.function_operation(name, payload).await
    }

    /// Like [`Gateway::call_function`], but concurrent calls sharing
    /// `dedup_key` collapse onto one in-flight request.
    pub async fn call_function_with_key(
        &self,
        name: &str,
        payload: Value,
        dedup_key: &str,
    ) -> Outcome {
        let operation = self.function_operation(name, payload);
        self.dedup.run(dedup_key, operation).await
    }

    /// GET from the REST backend under `/api/v1`.
    pub async fn get(&self, path: &str) -> Outcome {
        self.rest_operation(Method::GET, path, None).await
    }

    /// POST to the REST backend under `/api/v1`.
    pub async fn post(&self, path: &str, body: Value) -> Outcome {
        self.rest_operation(Method::POST, path, Some(body)).await
    }

    /// Like [`Gateway::post`], but deduplicated under `dedup_key`.
    pub async fn post_with_key(&self, path: &str, body: Value, dedup_key: &str) -> Outcome {
        let operation = self.rest_operation(Method::POST, path, Some(body));
        self.dedup.run(dedup_key, operation).await
    }

    /// PATCH to the REST backend under `/api/v1`.
    pub async fn patch(&self, path: &str, body: Value) -> Outcome {
        self.rest_operation(Method::PATCH, path, Some(body)).await
    }

    // Operations are built from owned clones so deduplicated futures can
    // outlive the borrow of `self`.
    fn function_operation(
        &self,
        name: &str,
        payload: Value,
    ) -> impl Future<Output = Outcome> + Send + 'static {
        run_function(
            self.http.clone(),
            self.config.clone(),
            self.tokens.clone(),
            name.to_string(),
            payload,
        )
    }

    fn rest_operation(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> impl Future<Output = Outcome> + Send + 'static {
        run_rest(
            self.http.clone(),
            self.config.clone(),
            self.tokens.clone(),
            method,
            path.to_string(),
            body,
        )
    }
}

async fn run_function(
    http: Client,
    config: GatewayConfig,
    tokens: Arc<dyn TokenProvider>,
    name: String,
    payload: Value,
) -> Outcome {
    let url = config.function_url(&name);
    let label = format!("function {name}");
    execute_with_retry(&label, &config.retry, || {
        function_attempt(http.clone(), tokens.clone(), url.clone(), name.clone(), payload.clone())
    })
    .await
}

async fn run_rest(
    http: Client,
    config: GatewayConfig,
    tokens: Arc<dyn TokenProvider>,
    method: Method,
    path: String,
    body: Option<Value>,
) -> Outcome {
    let url = config.api_url(&path);
    let label = format!("{} /api/v1/{}", method, path.trim_start_matches('/'));
    execute_with_retry(&label, &config.retry, || {
        rest_attempt(
            http.clone(),
            tokens.clone(),
            method.clone(),
            url.clone(),
            path.clone(),
            body.clone(),
        )
    })
    .await
}

/// Drive attempts until success, a permanent failure, or retry exhaustion.
async fn execute_with_retry<F, Fut>(
    operation: &str,
    config: &RetryConfig,
    mut attempt_fn: F,
) -> Outcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<Value>>,
{
    let mut attempt: u32 = 0;
    loop {
        match attempt_fn().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!(operation, attempts = attempt + 1, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(raw) => {
                let typed = classify::classify(&raw);
                if attempt >= config.max_retries || !retry::is_retryable(&typed) {
                    error!(
                        operation,
                        attempts = attempt + 1,
                        code = typed.code().as_str(),
                        error = %typed,
                        "Request failed"
                    );
                    return Err(typed);
                }

                let delay = retry::next_delay(attempt, config);
                warn!(
                    operation,
                    attempt = attempt + 1,
                    max_attempts = config.max_retries + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %typed,
                    "Transient failure, backing off"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

async fn function_attempt(
    http: Client,
    tokens: Arc<dyn TokenProvider>,
    url: String,
    name: String,
    payload: Value,
) -> anyhow::Result<Value> {
    let mut request = http.post(&url).json(&payload);
    if let Some(token) = tokens.bearer_token().await {
        request = request.header(AUTHORIZATION, format!("Bearer {}", token));
    }
    let response = request.send().await?;
    normalize_function_response(&name, response).await
}

/// Reduce a function response to its `data` member or a typed failure.
///
/// Non-2xx statuses and 2xx envelopes carrying an `error` member both
/// surface as `INTEGRATION_ERROR` naming the function; an unreadable error
/// body falls back to the generic envelope.
async fn normalize_function_response(function: &str, response: Response) -> anyhow::Result<Value> {
    let status = response.status();
    if !status.is_success() {
        let envelope: ErrorEnvelope =
            response.json().await.unwrap_or_else(|_| ErrorEnvelope::generic());
        let mut typed = TypedError::integration(
            function,
            format!("status {}: {}", status.as_u16(), envelope.error.message),
        );
        if let Some(hint) = envelope.error.hint {
            typed = typed.with_hint(hint);
        }
        return Err(typed.into());
    }

    let envelope: FunctionEnvelope = response.json().await?;
    if let Some(body) = envelope.error {
        let mut typed = TypedError::integration(function, body.message);
        if let Some(hint) = body.hint {
            typed = typed.with_hint(hint);
        }
        return Err(typed.into());
    }
    Ok(envelope.data)
}

async fn rest_attempt(
    http: Client,
    tokens: Arc<dyn TokenProvider>,
    method: Method,
    url: String,
    path: String,
    body: Option<Value>,
) -> anyhow::Result<Value> {
    let mut request = http.request(method, &url);
    if let Some(json) = &body {
        request = request.json(json);
    }
    if let Some(token) = tokens.bearer_token().await {
        request = request.header(AUTHORIZATION, format!("Bearer {}", token));
    }
    let response = request.send().await?;

    let status = response.status();
    if !status.is_success() {
        // Status stays in the message so the transient-marker scan can see
        // 502/503 while 4xx stays permanent.
        let typed = TypedError::unknown(format!(
            "API request to /{} failed with status {}",
            path.trim_start_matches('/'),
            status.as_u16()
        ));
        return Err(typed.into());
    }

    let text = response.text().await?;
    if text.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text)
        .map_err(|e| TypedError::unknown(format!("invalid response body: {}", e)).into())
}
