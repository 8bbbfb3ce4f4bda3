//! Composed alert messages

use serde::{Deserialize, Serialize};

/// Ready-to-send alert. Built once per triggered decision, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMessage {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub body: String,
}
