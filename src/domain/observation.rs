//! Price observations
//!
//! One timestamped price reading for a variant. Observations are append-only:
//! nothing in this crate updates or deletes them once recorded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::variant::VariantId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub variant_id: VariantId,
    /// Process clock at extraction time
    pub observed_at: DateTime<Utc>,
    /// Non-negative, currency-agnostic price
    pub price: f64,
}

impl PriceObservation {
    #[must_use]
    pub const fn new(variant_id: VariantId, observed_at: DateTime<Utc>, price: f64) -> Self {
        Self {
            variant_id,
            observed_at,
            price,
        }
    }

    /// Observation stamped with the current time.
    #[must_use]
    pub fn now(variant_id: VariantId, price: f64) -> Self {
        Self::new(variant_id, Utc::now(), price)
    }
}
