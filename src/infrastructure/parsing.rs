//! HTML parsing infrastructure for inventory pages
//!
//! Path expressions are CSS selectors compiled once at startup; extraction is a
//! pure function of the markup, the two paths and the clock.

pub mod price_extractor;
pub mod price_text;

pub use crate::infrastructure::parsing_error::{ParsingError, ParsingResult};
pub use price_extractor::{ListingSelection, PriceExtractor, compile_selector};
pub use price_text::PriceTextNormalizer;
