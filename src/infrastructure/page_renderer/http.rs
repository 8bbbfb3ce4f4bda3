//! Plain HTTP renderer for pages that need no client-side rendering

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use tracing::debug;

use crate::domain::{PageRenderer, RenderError};
use crate::infrastructure::config::RendererConfig;

#[derive(Clone)]
pub struct HttpPageRenderer {
    client: Client,
}

impl HttpPageRenderer {
    pub fn new(config: &RendererConfig) -> Result<Self, RenderError> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.ready_timeout_secs))
            .user_agent(&config.user_agent)
            .cookie_store(true)
            .gzip(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| RenderError::Http {
                url: String::new(),
                message: format!("failed to create HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageRenderer for HttpPageRenderer {
    /// Static markup is final once received, so `ready_selector` is not polled.
    async fn render(&self, url: &str, _ready_selector: &str) -> Result<String, RenderError> {
        let http_error = |e: reqwest::Error| RenderError::Http {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self.client.get(url).send().await.map_err(http_error)?;
        let status = response.status();
        debug!(url, %status, "HTTP response received");

        let response = response.error_for_status().map_err(http_error)?;
        response.text().await.map_err(http_error)
    }
}
