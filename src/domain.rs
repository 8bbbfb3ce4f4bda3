//! Domain module - core price monitoring types
//!
//! Variants, observations, alert decisions and the interfaces of the external
//! collaborators (renderer, history store, mail dispatcher).

pub mod alert;
pub mod errors;
pub mod notification;
pub mod observation;
pub mod repositories;
pub mod services;
pub mod variant;

pub use alert::{AlertDecision, AlertEvaluator};
pub use errors::{DeliveryError, PersistenceError, RenderError};
pub use notification::NotificationMessage;
pub use observation::PriceObservation;
pub use repositories::PriceHistoryStore;
pub use services::{NotificationDispatcher, PageRenderer};
pub use variant::{InvalidVariantId, ProductVariant, VariantCatalog, VariantId};
