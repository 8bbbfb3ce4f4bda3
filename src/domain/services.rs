//! External collaborator interfaces used by the monitoring pipeline

use async_trait::async_trait;

use super::errors::{DeliveryError, RenderError};
use super::notification::NotificationMessage;

/// Loads a URL in a browser engine and returns the settled markup.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// `ready_selector` names the node whose presence means dynamic content
    /// has finished rendering.
    async fn render(&self, url: &str, ready_selector: &str) -> Result<String, RenderError>;
}

/// Delivers a composed alert over some mail transport.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn send(&self, message: &NotificationMessage) -> Result<(), DeliveryError>;
}
