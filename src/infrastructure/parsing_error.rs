//! Parsing error types for price extraction
//!
//! Extraction failures are hard failures for a run: page layout drift or an
//! empty inventory must never turn into a zero-price observation.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParsingError {
    #[error("No node matches '{path}' ({context})")]
    NodeNotFound { path: String, context: String },

    #[error("Malformed price text '{raw}': {reason}")]
    MalformedPriceText { raw: String, reason: String },

    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },
}

impl ParsingError {
    pub fn node_not_found(path: &str, context: impl Into<String>) -> Self {
        Self::NodeNotFound {
            path: path.to_string(),
            context: context.into(),
        }
    }

    pub fn malformed_price_text(raw: &str, reason: impl Into<String>) -> Self {
        Self::MalformedPriceText {
            raw: raw.to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid_selector(selector: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }
}

pub type ParsingResult<T> = Result<T, ParsingError>;
