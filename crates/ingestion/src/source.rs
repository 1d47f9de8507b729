//! Where the publication CSV comes from

use crate::errors::IngestionError;
use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

/// Trait for fetching the raw CSV body
#[async_trait]
pub trait CsvSource: Send + Sync {
    /// Fetch the full body
    async fn fetch(&self) -> Result<String, IngestionError>;

    /// Human-readable location, for logs
    fn location(&self) -> &str;
}

/// CSV served over HTTP
pub struct HttpCsvSource {
    client: reqwest::Client,
    url: String,
}

impl HttpCsvSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, IngestionError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl CsvSource for HttpCsvSource {
    async fn fetch(&self) -> Result<String, IngestionError> {
        info!(url = %self.url, "Fetching publications");

        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(IngestionError::Fetch {
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }

    fn location(&self) -> &str {
        &self.url
    }
}

/// Fixed CSV body held in memory
pub struct StaticCsvSource {
    body: String,
}

impl StaticCsvSource {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }
}

#[async_trait]
impl CsvSource for StaticCsvSource {
    async fn fetch(&self) -> Result<String, IngestionError> {
        Ok(self.body.clone())
    }

    fn location(&self) -> &str {
        "static"
    }
}
