use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::config::ScraperConfig;
use crate::utils::error::{AppError, Result};

/// Source of raw listing page markup.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Plain HTTP GET with a per-request timeout.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let start_time = std::time::Instant::now();

        let response = self.client.get(url).send().await.map_err(|e| AppError::Fetch {
            url: url.to_string(),
            message: if e.is_timeout() {
                "request timed out".to_string()
            } else {
                e.to_string()
            },
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Fetch {
                url: url.to_string(),
                message: format!("HTTP {}", status),
            });
        }

        let body = response.bytes().await.map_err(|e| AppError::Fetch {
            url: url.to_string(),
            message: format!("Failed to read body: {}", e),
        })?;

        tracing::debug!(
            "Fetched {} ({} bytes in {} ms)",
            url,
            body.len(),
            start_time.elapsed().as_millis()
        );
        Ok(body.to_vec())
    }
}
