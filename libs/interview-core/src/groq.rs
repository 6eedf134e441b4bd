// Shared HTTP plumbing for the Groq OpenAI-compatible API
use anyhow::{bail, Context, Result};
use interview_common::config::DialogueConfig;
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

pub const API_KEY_ENV: &str = "GROQ_API_KEY";

const REQUEST_TIMEOUT_SECS: u64 = 60;
const INITIAL_RETRY_DELAY_MS: u64 = 500;
const MAX_RETRY_DELAY_MS: u64 = 8000;

pub struct GroqClient {
    http: Client,
    base_url: String,
    api_key: String,
    max_retries: u32,
}

impl GroqClient {
    pub fn new(config: &DialogueConfig, api_key: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            max_retries: config.max_retries,
        })
    }

    /// Client authenticated with `GROQ_API_KEY`
    pub fn from_env(config: &DialogueConfig) -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .with_context(|| format!("{} must be set", API_KEY_ENV))?;
        if api_key.trim().is_empty() {
            bail!("{} is empty", API_KEY_ENV);
        }
        Self::new(config, api_key)
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        debug!(url = %url, "Preparing Groq request");

        self.http
            .post(url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
    }

    /// Send a request, retrying rate limits, server errors and connection
    /// failures with exponential backoff.
    ///
    /// `make` is called once per attempt because multipart bodies cannot be
    /// cloned.
    pub async fn send<F>(&self, make: F) -> Result<Response>
    where
        F: Fn() -> Result<RequestBuilder> + Send + Sync,
    {
        let mut retry_count = 0;
        let mut retry_delay = Duration::from_millis(INITIAL_RETRY_DELAY_MS);

        loop {
            let result = make()?.send().await;

            let retryable = match &result {
                Ok(response) => is_retryable(response.status()),
                Err(e) => e.is_timeout() || e.is_connect(),
            };

            if retryable && retry_count < self.max_retries {
                retry_count += 1;
                warn!(
                    attempt = retry_count,
                    max_retries = self.max_retries,
                    delay_ms = retry_delay.as_millis() as u64,
                    "Groq request failed, retrying"
                );
                tokio::time::sleep(retry_delay).await;
                retry_delay = (retry_delay * 2).min(Duration::from_millis(MAX_RETRY_DELAY_MS));
                continue;
            }

            let response = result.context("Groq request failed")?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                bail!(
                    "Groq API error ({} {}): {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown"),
                    body
                );
            }

            return Ok(response);
        }
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::BAD_GATEWAY));
        assert!(is_retryable(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_retryable(StatusCode::UNAUTHORIZED));
        assert!(!is_retryable(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn test_url_joining() {
        let config = DialogueConfig {
            base_url: "https://api.groq.com/openai/v1/".to_string(),
            ..Default::default()
        };
        let client = GroqClient::new(&config, "key").unwrap();
        let request = client.post("/chat/completions").build().unwrap();

        assert_eq!(request.url().as_str(), "https://api.groq.com/openai/v1/chat/completions");
        assert_eq!(request.headers()[header::AUTHORIZATION], "Bearer key");
    }
}
