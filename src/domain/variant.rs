//! Tracked product variants
//!
//! A variant is one product configuration on the storefront (one trim of a
//! product line) with its own inventory page and reference price.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const MAX_VARIANT_ID_LEN: usize = 63;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid variant id '{0}': expected lowercase letters, digits and '_' starting with a letter")]
pub struct InvalidVariantId(pub String);

/// Stable symbolic name of a variant.
///
/// The id doubles as the name of the variant's time-series table, so it is
/// restricted to `[a-z][a-z0-9_]{0,62}`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VariantId(String);

impl VariantId {
    pub fn parse(raw: &str) -> Result<Self, InvalidVariantId> {
        let normalized = raw.trim().to_ascii_lowercase();
        if is_valid_identifier(&normalized) {
            Ok(Self(normalized))
        } else {
            Err(InvalidVariantId(raw.to_string()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the secondary index on the observation time.
    #[must_use]
    pub fn time_index_name(&self) -> String {
        format!("{}_time_idx", self.0)
    }

    /// Default human label, e.g. `MODEL_Y`.
    #[must_use]
    pub fn default_label(&self) -> String {
        self.0.to_ascii_uppercase()
    }
}

fn is_valid_identifier(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_lowercase());
    starts_with_letter
        && candidate.len() <= MAX_VARIANT_ID_LEN
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

impl TryFrom<String> for VariantId {
    type Error = InvalidVariantId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<VariantId> for String {
    fn from(value: VariantId) -> Self {
        value.0
    }
}

impl fmt::Display for VariantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Immutable configuration of one tracked variant for the whole run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductVariant {
    pub id: VariantId,
    pub label: String,
    pub inventory_url: String,
    /// CSS path to the listing container items
    pub listing_path: String,
    /// CSS path to the price node, relative to a listing item
    pub price_path: String,
    pub reference_price: f64,
}

/// Mapping from variant id to its configuration record.
#[derive(Debug, Clone, Default)]
pub struct VariantCatalog {
    variants: BTreeMap<VariantId, ProductVariant>,
}

impl VariantCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a variant, returning the previous record if any.
    pub fn insert(&mut self, variant: ProductVariant) -> Option<ProductVariant> {
        self.variants.insert(variant.id.clone(), variant)
    }

    #[must_use]
    pub fn get(&self, id: &VariantId) -> Option<&ProductVariant> {
        self.variants.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProductVariant> {
        self.variants.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Keep only the listed variants. An empty filter keeps everything.
    pub fn retain_ids(&mut self, ids: &[VariantId]) {
        if ids.is_empty() {
            return;
        }
        self.variants.retain(|id, _| ids.contains(id));
    }
}

impl FromIterator<ProductVariant> for VariantCatalog {
    fn from_iter<T: IntoIterator<Item = ProductVariant>>(iter: T) -> Self {
        let mut catalog = Self::new();
        for variant in iter {
            catalog.insert(variant);
        }
        catalog
    }
}
