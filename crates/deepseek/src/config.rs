use std::env::{self, VarError};
use std::fmt::Debug;
use std::time::Duration;

use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};

const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "DEEPSEEK_API_KEY";
/// Environment variable overriding the base URL.
pub const BASE_URL_ENV: &str = "DEEPSEEK_BASE_URL";

/// How transient failures (HTTP 429 and 503) are retried.
///
/// Delays grow exponentially from `initial_interval` by `multiplier`,
/// capped at `max_interval`, until `max_elapsed_time` has passed since
/// the first attempt.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
    /// The delay before the first retry.
    pub initial_interval: Duration,
    /// The factor applied to the delay after each retry.
    pub multiplier: f64,
    /// The upper bound of a single delay.
    pub max_interval: Duration,
    /// The total time budget for retries.
    pub max_elapsed_time: Duration,
}

impl RetryPolicy {
    /// A policy that never retries.
    #[inline]
    pub fn disabled() -> Self {
        Self {
            max_elapsed_time: Duration::ZERO,
            ..Default::default()
        }
    }

    pub(crate) fn to_backoff(self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_interval)
            .with_multiplier(self.multiplier)
            .with_max_interval(self.max_interval)
            .with_max_elapsed_time(Some(self.max_elapsed_time))
            .build()
    }
}

impl Default for RetryPolicy {
    #[inline]
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(1),
            multiplier: 2.0,
            max_interval: Duration::from_secs(30),
            max_elapsed_time: Duration::from_secs(120),
        }
    }
}

/// Builder for [`DeepSeekConfig`].
#[derive(Clone, PartialEq)]
pub struct DeepSeekConfigBuilder {
    api_key: String,
    base_url: Option<String>,
    retry: Option<RetryPolicy>,
}

impl DeepSeekConfigBuilder {
    /// Creates a builder with the given API key.
    #[inline]
    pub fn with_api_key<S: Into<String>>(api_key: S) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            retry: None,
        }
    }

    /// Sets a custom base URL.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the retry policy for transient failures.
    #[inline]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> DeepSeekConfig {
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        DeepSeekConfig {
            api_key: self.api_key,
            base_url: base_url.trim_end_matches('/').to_owned(),
            retry: self.retry.unwrap_or_default(),
        }
    }
}

impl Debug for DeepSeekConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeepSeekConfigBuilder")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("retry", &self.retry)
            .finish()
    }
}

/// Configuration for the DeepSeek client.
#[derive(Clone, PartialEq)]
pub struct DeepSeekConfig {
    pub(crate) api_key: String,
    pub(crate) base_url: String,
    pub(crate) retry: RetryPolicy,
}

impl DeepSeekConfig {
    /// Reads the configuration from `DEEPSEEK_API_KEY` and, if set,
    /// `DEEPSEEK_BASE_URL`.
    pub fn from_env() -> Result<Self, VarError> {
        let api_key = env::var(API_KEY_ENV)?;
        let mut builder = DeepSeekConfigBuilder::with_api_key(api_key);
        match env::var(BASE_URL_ENV) {
            Ok(base_url) => builder = builder.with_base_url(base_url),
            Err(VarError::NotPresent) => {}
            Err(err) => return Err(err),
        }
        Ok(builder.build())
    }

    /// Returns the base URL requests are sent to.
    #[inline]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the retry policy.
    #[inline]
    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }
}

impl Debug for DeepSeekConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeepSeekConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("retry", &self.retry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DeepSeekConfigBuilder::with_api_key("sk-secret").build();
        assert_eq!(config.base_url(), "https://api.deepseek.com");
        assert_eq!(config.retry(), RetryPolicy::default());
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let config = DeepSeekConfigBuilder::with_api_key("sk-secret")
            .with_base_url("http://localhost:8080/v1/")
            .build();
        assert_eq!(config.base_url(), "http://localhost:8080/v1");
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let builder = DeepSeekConfigBuilder::with_api_key("sk-secret");
        assert!(!format!("{builder:?}").contains("sk-secret"));
        assert!(!format!("{:?}", builder.build()).contains("sk-secret"));
    }

    #[test]
    fn test_disabled_retry() {
        let retry = RetryPolicy::disabled();
        assert_eq!(retry.max_elapsed_time, Duration::ZERO);
        let backoff = retry.to_backoff();
        assert_eq!(backoff.max_elapsed_time, Some(Duration::ZERO));
    }
}
