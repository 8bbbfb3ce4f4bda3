//! Price extraction from rendered inventory markup
//!
//! Walks the listing items of the inventory page, reads the price node inside
//! each one and normalizes it into a [`PriceObservation`].

use chrono::Utc;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::price_text::PriceTextNormalizer;
use crate::domain::{PriceObservation, ProductVariant, VariantId};
use crate::infrastructure::parsing_error::{ParsingError, ParsingResult};

/// Which listing item supplies the observed price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingSelection {
    /// Trust the page order: the first item is assumed cheapest.
    First,
    /// Read every item and take the minimum explicitly.
    #[default]
    Lowest,
}

/// Compile a CSS path expression, keeping the source text for error reports.
pub fn compile_selector(path: &str) -> ParsingResult<Selector> {
    Selector::parse(path).map_err(|e| ParsingError::invalid_selector(path, e.to_string()))
}

pub struct PriceExtractor {
    listing_path: String,
    listing_selector: Selector,
    price_path: String,
    price_selector: Selector,
    selection: ListingSelection,
}

impl PriceExtractor {
    pub fn new(listing_path: &str, price_path: &str, selection: ListingSelection) -> ParsingResult<Self> {
        Ok(Self {
            listing_path: listing_path.to_string(),
            listing_selector: compile_selector(listing_path)?,
            price_path: price_path.to_string(),
            price_selector: compile_selector(price_path)?,
            selection,
        })
    }

    pub fn for_variant(variant: &ProductVariant, selection: ListingSelection) -> ParsingResult<Self> {
        Self::new(&variant.listing_path, &variant.price_path, selection)
    }

    /// Extract one observation for `variant_id`, stamped with the current time.
    pub fn extract(&self, variant_id: &VariantId, markup: &str) -> ParsingResult<PriceObservation> {
        let document = Html::parse_document(markup);
        let price = match self.selection {
            ListingSelection::First => self.first_listing_price(&document)?,
            ListingSelection::Lowest => self.lowest_listing_price(&document)?,
        };
        debug!(variant = %variant_id, price, "Extracted listing price");
        Ok(PriceObservation::new(variant_id.clone(), Utc::now(), price))
    }

    fn first_listing_price(&self, document: &Html) -> ParsingResult<f64> {
        let first = document
            .select(&self.listing_selector)
            .next()
            .ok_or_else(|| ParsingError::node_not_found(&self.listing_path, "no listing items on page"))?;
        self.listing_price(first, 0)
    }

    fn lowest_listing_price(&self, document: &Html) -> ParsingResult<f64> {
        let prices = document
            .select(&self.listing_selector)
            .enumerate()
            .map(|(index, listing)| self.listing_price(listing, index))
            .collect::<ParsingResult<Vec<f64>>>()?;

        let Some(&first) = prices.first() else {
            return Err(ParsingError::node_not_found(&self.listing_path, "no listing items on page"));
        };
        let lowest = prices.iter().copied().fold(first, f64::min);

        if lowest < first {
            warn!(
                first,
                lowest,
                listings = prices.len(),
                "Inventory is not sorted by ascending price; using the lowest listing"
            );
        }
        Ok(lowest)
    }

    fn listing_price(&self, listing: ElementRef<'_>, index: usize) -> ParsingResult<f64> {
        let price_node = listing.select(&self.price_selector).next().ok_or_else(|| {
            ParsingError::node_not_found(
                &self.price_path,
                format!("inside listing #{index} matched by '{}'", self.listing_path),
            )
        })?;
        let text = price_node.text().collect::<String>();
        debug!(index, text = %text.trim(), "Listing price text");
        PriceTextNormalizer::normalize(&text)
    }
}
