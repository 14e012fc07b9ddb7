//! HTTP plumbing shared by the remote generators.

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, Response, StatusCode};
use std::num::NonZeroU32;
use std::time::Duration;

use crate::domain::ports::GenerationError;

/// Token-bucket limiter on outgoing generation calls.
///
/// One limiter is shared by every run that uses the same generator.
pub struct RequestLimiter {
    limiter: DefaultDirectRateLimiter,
}

impl RequestLimiter {
    pub fn per_second(requests_per_second: u32) -> Self {
        let rate = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: RateLimiter::direct(Quota::per_second(rate)),
        }
    }

    /// Wait until a request may be sent.
    pub async fn acquire(&self) {
        self.limiter.until_ready().await;
    }
}

pub fn build_client(timeout_secs: u64) -> Result<Client, GenerationError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| GenerationError::NotConfigured(format!("Failed to create HTTP client: {e}")))
}

pub fn map_transport_error(err: &reqwest::Error, timeout_secs: u64) -> GenerationError {
    if err.is_timeout() {
        GenerationError::Timeout(timeout_secs)
    } else {
        GenerationError::NetworkError(err.to_string())
    }
}

/// Turn a non-success response into the matching error.
pub async fn check_status(response: Response) -> Result<Response, GenerationError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "unable to read response body".to_string());
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            GenerationError::AuthError(format!("{status}: {body}"))
        }
        StatusCode::TOO_MANY_REQUESTS => GenerationError::RateLimitExceeded,
        s if s.is_server_error() => GenerationError::Unavailable(format!("{status}: {body}")),
        _ => GenerationError::ExecutionFailed(format!("API error {status}: {body}")),
    })
}
