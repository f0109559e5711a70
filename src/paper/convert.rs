use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use crate::error::PaperError;

/// Document-to-markdown conversion capability (arxiv2md in production).
#[async_trait]
pub trait Converter: Send + Sync {
    async fn to_markdown(&self, url: &str) -> Result<String, PaperError>;
}

pub struct ArxivToMdClient {
    client: reqwest::Client,
    base_url: String,
}

impl ArxivToMdClient {
    pub fn from_env() -> Result<Self> {
        let base_url = dotenv::var("BASE_URL_ARXIV2MD")
            .unwrap_or_else(|_| "https://arxiv2md.org/api/ingest".to_string());
        // conversion of a full paper can take a while
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl Converter for ArxivToMdClient {
    async fn to_markdown(&self, url: &str) -> Result<String, PaperError> {
        let body = serde_json::json!({ "input_text": url });
        let resp = self
            .client
            .post(&self.base_url)
            .json(&body)
            .send()
            .await
            .map_err(PaperError::ConversionRequest)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(PaperError::ConversionStatus(status.as_u16()));
        }

        let data: serde_json::Value = resp
            .json()
            .await
            .map_err(PaperError::ConversionRequest)?;
        debug!(url, "conversion response received");

        match data.get("content").and_then(|c| c.as_str()) {
            Some(content) if !content.is_empty() => Ok(content.to_string()),
            _ => Err(PaperError::EmptyContent),
        }
    }
}
