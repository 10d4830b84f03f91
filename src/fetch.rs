//! Page fetching with bounded retry.
//!
//! [`PageFetcher`] is the only suspension point of a collection run.
//! [`HttpFetcher`] implements it over `reqwest` with a per-request timeout
//! and exponential backoff:
//!
//! - HTTP 429 or 5xx → retry
//! - Network error or timeout → retry
//! - Any other non-success status → fail immediately
//!
//! Once retries are exhausted the failure is reported as
//! [`HarnessError::TransientFetch`] and the caller decides what to skip.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::CollectorConfig;
use crate::error::HarnessError;

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` and return the response body as text.
    async fn fetch(&self, url: &str) -> std::result::Result<String, HarnessError>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
    max_retries: u32,
    backoff: Duration,
}

impl HttpFetcher {
    pub fn new(config: &CollectorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
            backoff: Duration::from_millis(config.backoff_ms),
        })
    }
}

/// Delay before retry number `attempt` (1-based): base, 2×base, 4×base, … capped at 32×.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base * (1u32 << (attempt.saturating_sub(1)).min(5))
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<String, HarnessError> {
        let mut last_err = String::new();
        let mut attempts = 0;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = backoff_delay(self.backoff, attempt);
                tracing::debug!(url, attempt, ?delay, "retrying page fetch");
                tokio::time::sleep(delay).await;
            }
            attempts = attempt + 1;

            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        match response.text().await {
                            Ok(body) => return Ok(body),
                            Err(e) => {
                                last_err = e.to_string();
                                continue;
                            }
                        }
                    }

                    // Rate limited or server error — retry
                    if status.as_u16() == 429 || status.is_server_error() {
                        last_err = format!("HTTP {}", status);
                        continue;
                    }

                    return Err(HarnessError::TransientFetch {
                        url: url.to_string(),
                        attempts,
                        message: format!("HTTP {}", status),
                    });
                }
                Err(e) => {
                    last_err = e.to_string();
                    continue;
                }
            }
        }

        Err(HarnessError::TransientFetch {
            url: url.to_string(),
            attempts,
            message: last_err,
        })
    }
}
