//! Shared HTTP client construction and response screening

use std::time::{Duration, Instant};

use reqwest::Response;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use tracing::{debug, error, warn};

use crate::{PlannerError, Result};

const USER_AGENT: &str = concat!("LayoverPlanner/", env!("CARGO_PKG_VERSION"));

/// Build a client with a per-request timeout and bounded retries.
///
/// Only transient failures (connect errors, timeouts, 5xx, 429) are retried,
/// with exponential backoff between attempts.
pub fn build_client(timeout: Duration, max_retries: u32) -> Result<ClientWithMiddleware> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| PlannerError::config(format!("Failed to create HTTP client: {e}")))?;

    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);

    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

/// Send a request and turn non-success statuses into upstream errors
pub async fn send(service: &str, request: RequestBuilder) -> Result<Response> {
    let started = Instant::now();

    let response = request.send().await.map_err(|e| {
        let reason = describe(e);
        warn!("{service} request failed after {:.3}s: {reason}", started.elapsed().as_secs_f64());
        PlannerError::upstream(service, format!("request failed: {reason}"))
    })?;

    let status = response.status();
    let elapsed = started.elapsed();
    debug!("{service} responded {status} in {:.3}s", elapsed.as_secs_f64());

    if elapsed.as_secs() > 5 {
        warn!("Slow {service} response: {:.3}s", elapsed.as_secs_f64());
    }

    if status.is_success() {
        return Ok(response);
    }

    let message = match status.as_u16() {
        401 | 403 => "authentication failed, check the API key".to_string(),
        429 => "rate limit exceeded and retry attempts exhausted".to_string(),
        _ => {
            let body = response.text().await.unwrap_or_default();
            format!(
                "HTTP {} - {}",
                status,
                body.chars().take(300).collect::<String>()
            )
        }
    };
    error!("{service} request rejected: {message}");
    Err(PlannerError::upstream(service, message))
}

/// Transport error text without the request URL, which may carry an API key
fn describe(err: reqwest_middleware::Error) -> String {
    match err {
        reqwest_middleware::Error::Reqwest(e) => redact_key(&e.without_url().to_string()),
        other => redact_key(&other.to_string()),
    }
}

/// Mask the value of every `key=` query parameter in `text`
#[must_use]
pub fn redact_key(text: &str) -> String {
    const MARKER: &str = "key=";
    let mut redacted = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find(MARKER) {
        let (head, tail) = rest.split_at(pos + MARKER.len());
        redacted.push_str(head);
        redacted.push_str("***");
        let end = tail
            .find(|c: char| matches!(c, '&' | ')' | '"' | '\'') || c.is_whitespace())
            .unwrap_or(tail.len());
        rest = &tail[end..];
    }
    redacted.push_str(rest);
    redacted
}
