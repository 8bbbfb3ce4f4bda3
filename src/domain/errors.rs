//! Errors raised at the external collaborator boundaries
//!
//! Rendering, persistence and delivery are the three places where the pipeline
//! talks to the outside world; each gets its own error type so the
//! orchestration can decide per stage whether to abort or continue.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Browser failure while loading {url}: {message}")]
    Browser { url: String, message: String },

    #[error("HTTP request for {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("Rendering {url} exceeded {limit:?}")]
    Timeout { url: String, limit: Duration },
}

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Schema setup for '{table}' failed: {source}")]
    Schema {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Insert into '{table}' failed: {source}")]
    Insert {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Query on '{table}' failed: {source}")]
    Query {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Database operation exceeded {0:?}")]
    Timeout(Duration),
}

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Invalid mail address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Invalid mail transport configuration: {0}")]
    Transport(String),

    #[error("Could not build mail message: {0}")]
    Message(String),

    #[error("SMTP delivery failed: {0}")]
    Smtp(String),

    #[error("Mail delivery exceeded {0:?}")]
    Timeout(Duration),
}
