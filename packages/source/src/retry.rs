//! HTTP retry helpers for transient errors.
//!
//! Feed adapters should use [`send_text`] instead of calling
//! `reqwest::RequestBuilder::send()` directly so every request gets
//! automatic retry with exponential backoff for transient failures
//! (timeouts, connection resets, server errors, rate limiting).
//!
//! # Usage
//!
//! ```ignore
//! use crate::retry;
//!
//! let body = retry::send_text(|| client.get(&url), 3).await?;
//! ```

use std::time::Duration;

use crate::FetchError;

/// Maximum length of the response body preview included in error logs.
const BODY_PREVIEW_LEN: usize = 200;

/// Sends an HTTP request and returns the response body as a `String`.
///
/// The `build_request` closure is called on each attempt to construct a
/// fresh [`reqwest::RequestBuilder`] (since builders are consumed by
/// `.send()`).
///
/// Retries up to `max_retries` times with exponential backoff on
/// connection errors, timeouts, HTTP 429, and HTTP 5xx. Does **not** retry
/// HTTP 4xx (except 429) since those are permanent.
///
/// # Errors
///
/// Returns [`FetchError`] if the request fails after all retries, the
/// server returns a non-retryable status code, or the body cannot be read.
#[allow(clippy::future_not_send)]
pub async fn send_text<F>(build_request: F, max_retries: u32) -> Result<String, FetchError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let response = send_inner(&build_request, max_retries).await?;
    let url = response.url().to_string();
    let status = response.status();

    match response.text().await {
        Ok(text) => {
            log::debug!("{url}: HTTP {status}, {} bytes", text.len());
            Ok(text)
        }
        Err(e) => {
            log::error!("Response body read failed.\n  url: {url}\n  status: {status}\n  error: {e}");
            Err(FetchError::Http(e))
        }
    }
}

/// Core retry loop.
///
/// Sends the request built by `build_request`, retrying on transient
/// errors up to `max_retries` times with exponential backoff. Returns
/// the successful [`reqwest::Response`] (status 2xx or 3xx).
#[allow(clippy::future_not_send)]
async fn send_inner<F>(
    build_request: &F,
    max_retries: u32,
) -> Result<reqwest::Response, FetchError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut last_error: Option<FetchError> = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let delay = backoff_delay(attempt);
            log::warn!("  retry {attempt}/{max_retries} in {delay:?}...");
            tokio::time::sleep(delay).await;
        }

        match build_request().send().await {
            Err(e) => {
                if is_transient(&e) && attempt < max_retries {
                    log::warn!("  transient error: {e}");
                    last_error = Some(FetchError::Http(e));
                    continue;
                }
                return Err(FetchError::Http(e));
            }
            Ok(response) => {
                let status = response.status();
                let url = response.url().to_string();

                if is_retryable_status(status) {
                    if attempt < max_retries {
                        log::warn!("  HTTP {status} from {url}");
                        last_error = Some(FetchError::Status {
                            status: status.as_u16(),
                            url,
                        });
                        continue;
                    }
                    return Err(FetchError::Status {
                        status: status.as_u16(),
                        url,
                    });
                }

                if status.is_client_error() {
                    let body = response.text().await.unwrap_or_default();
                    log::error!("HTTP {status} from {url}: {}", preview(&body));
                    return Err(FetchError::Status {
                        status: status.as_u16(),
                        url,
                    });
                }

                return Ok(response);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| FetchError::Upstream {
        message: "request failed after all retries".to_string(),
    }))
}

/// Backoff before retry `attempt` (1-based): 1s, 2s, 4s, ... capped at 30s.
fn backoff_delay(attempt: u32) -> Duration {
    let secs = 1u64 << attempt.saturating_sub(1).min(5);
    Duration::from_secs(secs.min(30))
}

/// 429 and 5xx are worth retrying; everything else is final.
fn is_retryable_status(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Returns `true` if the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_request()
}

fn preview(body: &str) -> &str {
    if body.len() <= BODY_PREVIEW_LEN {
        return body;
    }
    let mut end = BODY_PREVIEW_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
