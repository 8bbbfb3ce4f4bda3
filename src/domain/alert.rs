//! Alert decisions
//!
//! The evaluator is a pure, total function: a price at or below the reference
//! triggers a notification.

use super::observation::PriceObservation;

/// Derived per run, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertDecision {
    pub should_notify: bool,
    pub observation: PriceObservation,
    pub reference_price: f64,
    pub source_url: String,
}

pub struct AlertEvaluator;

impl AlertEvaluator {
    /// Boundary inclusive: equality counts as a trigger.
    #[must_use]
    pub fn evaluate(observation: &PriceObservation, reference_price: f64, source_url: &str) -> AlertDecision {
        AlertDecision {
            should_notify: observation.price <= reference_price,
            observation: observation.clone(),
            reference_price,
            source_url: source_url.to_string(),
        }
    }
}
