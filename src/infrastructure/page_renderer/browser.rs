//! Headless browser renderer built on chromiumoxide
//!
//! A fresh browser is launched per render and always shut down afterwards, so
//! concurrent variant runs never share a browser process.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::domain::{PageRenderer, RenderError};
use crate::infrastructure::config::RendererConfig;

pub struct BrowserPageRenderer {
    config: RendererConfig,
}

impl BrowserPageRenderer {
    pub fn new(config: RendererConfig) -> Result<Self, RenderError> {
        if let Some(executable) = &config.chrome_executable {
            if !executable.exists() {
                return Err(RenderError::Browser {
                    url: String::new(),
                    message: format!("chrome executable not found at {}", executable.display()),
                });
            }
        }
        Ok(Self { config })
    }

    fn browser_config(&self, url: &str) -> Result<BrowserConfig, RenderError> {
        let mut builder = BrowserConfig::builder()
            .request_timeout(Duration::from_secs(self.config.ready_timeout_secs))
            .arg(format!("--user-agent={}", self.config.user_agent))
            .args(["--disable-dev-shm-usage", "--no-first-run", "--no-default-browser-check"]);

        if !self.config.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = &self.config.chrome_executable {
            builder = builder.chrome_executable(executable.clone());
        }

        builder.build().map_err(|message| RenderError::Browser {
            url: url.to_string(),
            message: format!("browser config error: {message}"),
        })
    }

    async fn load_and_wait(&self, browser: &Browser, url: &str, ready_selector: &str) -> Result<String, RenderError> {
        let browser_error = |e: chromiumoxide::error::CdpError| RenderError::Browser {
            url: url.to_string(),
            message: e.to_string(),
        };

        let page = browser.new_page(url).await.map_err(browser_error)?;
        debug!(url, "Page navigated, waiting for listing");

        let ready_timeout = Duration::from_secs(self.config.ready_timeout_secs);
        let poll_interval = Duration::from_millis(self.config.poll_interval_ms.max(1));
        let started = Instant::now();

        let page = &page;
        let rendered = wait_for_listing(
            || async move { page.find_element(ready_selector).await.is_ok() },
            ready_timeout,
            poll_interval,
        )
        .await;
        if rendered {
            debug!(url, waited_ms = started.elapsed().as_millis(), "Listing rendered");
        } else {
            // Empty inventory or layout drift; extraction reports the missing node
            warn!(url, selector = ready_selector, waited = ?started.elapsed(), "Listing did not appear, reading page as is");
        }

        if self.config.settle_delay_ms > 0 {
            sleep(Duration::from_millis(self.config.settle_delay_ms)).await;
        }

        page.content().await.map_err(browser_error)
    }
}

/// Poll `listing_present` until it reports true or `timeout` elapses.
async fn wait_for_listing<F, Fut>(mut listing_present: F, timeout: Duration, poll_interval: Duration) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let started = Instant::now();
    loop {
        if listing_present().await {
            return true;
        }
        if started.elapsed() >= timeout {
            return false;
        }
        sleep(poll_interval).await;
    }
}

#[async_trait]
impl PageRenderer for BrowserPageRenderer {
    async fn render(&self, url: &str, ready_selector: &str) -> Result<String, RenderError> {
        let (mut browser, mut handler) = Browser::launch(self.browser_config(url)?)
            .await
            .map_err(|e| RenderError::Browser {
                url: url.to_string(),
                message: format!("failed to launch browser: {e}"),
            })?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        info!(url, "Rendering inventory page");
        let markup = self.load_and_wait(&browser, url, ready_selector).await;

        if let Err(e) = browser.close().await {
            warn!(url, error = %e, "Browser did not close cleanly");
        }
        if let Err(e) = browser.wait().await {
            warn!(url, error = %e, "Browser process did not exit cleanly");
        }
        handler_task.abort();

        markup
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_missing_chrome_executable_is_rejected() {
        let config = RendererConfig {
            chrome_executable: Some(PathBuf::from("/nonexistent/chrome-for-price-monitor")),
            ..RendererConfig::default()
        };
        let err = BrowserPageRenderer::new(config).err().unwrap();
        assert!(matches!(err, RenderError::Browser { ref message, .. } if message.contains("not found")));
    }

    #[test]
    fn test_renderer_without_explicit_executable_is_constructed() {
        assert!(BrowserPageRenderer::new(RendererConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_wait_gives_up_after_timeout() {
        let started = Instant::now();
        let rendered =
            wait_for_listing(|| async { false }, Duration::from_millis(50), Duration::from_millis(10)).await;
        assert!(!rendered);
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_wait_stops_once_listing_appears() {
        let mut polls = 0;
        let rendered = wait_for_listing(
            || {
                polls += 1;
                let present = polls >= 3;
                async move { present }
            },
            Duration::from_secs(5),
            Duration::from_millis(1),
        )
        .await;
        assert!(rendered);
        assert_eq!(polls, 3);
    }
}
