//! Page renderers
//!
//! The storefront renders its inventory client-side, so the default renderer
//! drives a headless browser. A plain HTTP renderer covers static pages and
//! local testing.

pub mod browser;
pub mod http;

use std::sync::Arc;

use crate::domain::{PageRenderer, RenderError};
use crate::infrastructure::config::{RendererConfig, RendererKind};

pub use browser::BrowserPageRenderer;
pub use http::HttpPageRenderer;

/// Build the renderer selected by `renderer.kind`.
pub fn build_page_renderer(config: &RendererConfig) -> Result<Arc<dyn PageRenderer>, RenderError> {
    Ok(match config.kind {
        RendererKind::Browser => Arc::new(BrowserPageRenderer::new(config.clone())?),
        RendererKind::Http => Arc::new(HttpPageRenderer::new(config)?),
    })
}
