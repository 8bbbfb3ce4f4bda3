//! Repository interfaces for the price history
//!
//! One physical series per variant; the store only ever appends.

use async_trait::async_trait;

use super::errors::PersistenceError;
use super::observation::PriceObservation;
use super::variant::VariantId;

#[async_trait]
pub trait PriceHistoryStore: Send + Sync {
    /// Create the variant's series and its time index if absent. Idempotent.
    async fn ensure_schema(&self, variant_id: &VariantId) -> Result<(), PersistenceError>;

    /// Insert exactly one row for the observation.
    async fn append(&self, observation: &PriceObservation) -> Result<(), PersistenceError>;

    /// Most recent `limit` observations, returned oldest first.
    async fn recent(&self, variant_id: &VariantId, limit: u32) -> Result<Vec<PriceObservation>, PersistenceError>;
}
