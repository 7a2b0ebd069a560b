use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::{Client, Response, StatusCode, header::RETRY_AFTER};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::FetchConfig;
use crate::errors::{AppError, AppResult, FetchError, FetchResult};
use crate::utils::url::UrlUtils;

/// Source of raw image bytes for the fetch-convert workers
///
/// The production implementation is [`RetryingHttpClient`]; tests plug in
/// in-memory sources.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Fetch the full body behind `url`
    async fn fetch_bytes(&self, url: &str) -> FetchResult<Bytes>;
}

/// Retry behaviour for idempotent GET requests
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub retries: u32,
    /// Seconds; retry `n` waits `backoff_factor * 2^(n-1)`
    pub backoff_factor: f64,
    pub max_backoff: Duration,
    pub retry_statuses: Vec<u16>,
}

impl RetryPolicy {
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            retries: config.retries,
            backoff_factor: config.backoff_factor,
            max_backoff: config.max_backoff,
            retry_statuses: config.retry_statuses.clone(),
        }
    }

    pub fn is_retryable_status(&self, status: StatusCode) -> bool {
        self.retry_statuses.contains(&status.as_u16())
    }

    /// Delay before retry number `retry` (1-based), capped at `max_backoff`
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(30) as i32;
        let seconds = self.backoff_factor * 2f64.powi(exponent);
        let max_seconds = self.max_backoff.as_secs_f64();

        Duration::try_from_secs_f64(seconds.min(max_seconds)).unwrap_or(self.max_backoff)
    }

    /// Delay for the next retry, preferring a larger server-provided hint
    fn delay_for(&self, retry: u32, retry_after: Option<Duration>) -> Duration {
        let computed = self.backoff_for(retry);
        match retry_after {
            Some(hint) if hint > computed => hint.min(self.max_backoff),
            _ => computed,
        }
    }
}

/// Outcome of one request attempt, before the retry decision
enum Attempt {
    Done(Bytes),
    RetryableStatus {
        status: StatusCode,
        retry_after: Option<Duration>,
    },
    Transport(String),
}

/// Shared HTTP client with a fixed retry policy
///
/// Built once from configuration and never mutated afterwards, so workers
/// share it behind an `Arc` without locking.
pub struct RetryingHttpClient {
    client: Client,
    policy: RetryPolicy,
    max_body_bytes: u64,
}

impl RetryingHttpClient {
    pub fn new(config: &FetchConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            policy: RetryPolicy::from_config(config),
            max_body_bytes: config.max_image_bytes,
        })
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    async fn attempt(&self, url: &str) -> FetchResult<Attempt> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) if e.is_builder() => {
                return Err(FetchError::InvalidUrl {
                    url: UrlUtils::obfuscate_credentials(url),
                    message: e.to_string(),
                });
            }
            Err(e) => {
                return Ok(Attempt::Transport(UrlUtils::obfuscate_credentials(
                    &e.to_string(),
                )));
            }
        };

        let status = response.status();
        if status.is_success() {
            return self.read_body(response, url).await;
        }

        if self.policy.is_retryable_status(status) {
            let retry_after = match status {
                StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE => {
                    parse_retry_after(&response)
                }
                _ => None,
            };
            return Ok(Attempt::RetryableStatus {
                status,
                retry_after,
            });
        }

        Err(FetchError::status(
            UrlUtils::obfuscate_credentials(url),
            status.as_u16(),
            1,
        ))
    }

    /// Buffer the full body, enforcing the size limit
    async fn read_body(&self, mut response: Response, url: &str) -> FetchResult<Attempt> {
        if let Some(length) = response.content_length()
            && length > self.max_body_bytes
        {
            return Err(FetchError::TooLarge {
                url: UrlUtils::obfuscate_credentials(url),
                size: length,
                max_size: self.max_body_bytes,
            });
        }

        let mut body = BytesMut::new();
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    body.extend_from_slice(&chunk);
                    if body.len() as u64 > self.max_body_bytes {
                        return Err(FetchError::TooLarge {
                            url: UrlUtils::obfuscate_credentials(url),
                            size: body.len() as u64,
                            max_size: self.max_body_bytes,
                        });
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    return Ok(Attempt::Transport(format!(
                        "Failed to read response body: {}",
                        UrlUtils::obfuscate_credentials(&e.to_string())
                    )));
                }
            }
        }

        Ok(Attempt::Done(body.freeze()))
    }
}

fn parse_retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[async_trait]
impl ImageSource for RetryingHttpClient {
    async fn fetch_bytes(&self, url: &str) -> FetchResult<Bytes> {
        let safe_url = UrlUtils::obfuscate_credentials(url);
        let mut retry: u32 = 0;

        loop {
            let attempts = retry + 1;
            let (reason, retry_after) = match self.attempt(url).await {
                Ok(Attempt::Done(bytes)) => {
                    debug!(
                        "Fetched {} bytes from {} (attempt {})",
                        bytes.len(),
                        safe_url,
                        attempts
                    );
                    return Ok(bytes);
                }
                Ok(Attempt::RetryableStatus {
                    status,
                    retry_after,
                }) => {
                    if retry >= self.policy.retries {
                        return Err(FetchError::status(
                            safe_url.clone(),
                            status.as_u16(),
                            attempts,
                        ));
                    }
                    (format!("HTTP {status}"), retry_after)
                }
                Ok(Attempt::Transport(message)) => {
                    if retry >= self.policy.retries {
                        return Err(FetchError::transport(safe_url.clone(), message));
                    }
                    (message, None)
                }
                Err(FetchError::Status { url, status, .. }) => {
                    return Err(FetchError::status(url, status, attempts));
                }
                Err(e) => return Err(e),
            };

            retry += 1;
            let delay = self.policy.delay_for(retry, retry_after);
            warn!(
                "Fetch of {} failed on attempt {}/{} ({}), retrying in {:?}",
                safe_url,
                attempts,
                self.policy.retries + 1,
                reason,
                delay
            );
            sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(factor: f64) -> RetryPolicy {
        RetryPolicy {
            retries: 3,
            backoff_factor: factor,
            max_backoff: Duration::from_secs(2),
            retry_statuses: vec![429, 500, 502, 503, 504],
        }
    }

    #[test]
    fn test_backoff_is_exponential_and_capped() {
        let policy = policy(0.5);
        assert_eq!(policy.backoff_for(1), Duration::from_millis(500));
        assert_eq!(policy.backoff_for(2), Duration::from_secs(1));
        assert_eq!(policy.backoff_for(3), Duration::from_secs(2));
        assert_eq!(policy.backoff_for(4), Duration::from_secs(2));
    }

    #[test]
    fn test_zero_factor_never_sleeps() {
        let policy = policy(0.0);
        assert_eq!(policy.backoff_for(1), Duration::ZERO);
        assert_eq!(policy.backoff_for(10), Duration::ZERO);
    }

    #[test]
    fn test_retry_after_only_extends_delay() {
        let policy = policy(0.5);
        assert_eq!(
            policy.delay_for(1, Some(Duration::from_secs(1))),
            Duration::from_secs(1)
        );
        assert_eq!(
            policy.delay_for(3, Some(Duration::from_millis(100))),
            Duration::from_secs(2)
        );
        assert_eq!(
            policy.delay_for(1, Some(Duration::from_secs(600))),
            Duration::from_secs(2)
        );
    }

    #[test]
    fn test_retryable_statuses() {
        let policy = policy(0.5);
        assert!(policy.is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(policy.is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(!policy.is_retryable_status(StatusCode::NOT_FOUND));
        assert!(!policy.is_retryable_status(StatusCode::NOT_IMPLEMENTED));
    }

    #[tokio::test]
    async fn test_invalid_url_fails_without_retry() {
        let client = RetryingHttpClient::new(&FetchConfig::default()).unwrap();
        let err = client.fetch_bytes("not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }
}
