//! Price monitoring pipeline for one variant
//!
//! Stages run strictly in order, never going back:
//! `Rendering → Extracting → Persisting → Evaluating → (Notifying | Done)`.
//! Render, extraction and persistence failures abort the run. Once the
//! observation is stored, a notification failure is reported but the run
//! still completes.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::domain::{
    AlertDecision, AlertEvaluator, DeliveryError, NotificationDispatcher, PageRenderer, PersistenceError,
    PriceHistoryStore, PriceObservation, ProductVariant, RenderError, VariantId,
};
use crate::infrastructure::config::TimeoutConfig;
use crate::infrastructure::notification::{NotificationComposer, NotificationFields, TemplateError};
use crate::infrastructure::parsing::{ListingSelection, ParsingError, PriceExtractor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Rendering,
    Extracting,
    Persisting,
    Evaluating,
    Notifying,
    Done,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Rendering => "rendering",
            Self::Extracting => "extracting",
            Self::Persisting => "persisting",
            Self::Evaluating => "evaluating",
            Self::Notifying => "notifying",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Underlying cause of an aborted run.
#[derive(Error, Debug)]
pub enum StageError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Extraction(#[from] ParsingError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

#[derive(Error, Debug)]
#[error("Variant '{variant}' failed while {stage}: {source}")]
pub struct PipelineError {
    pub variant: VariantId,
    pub stage: PipelineStage,
    #[source]
    pub source: StageError,
}

/// What happened to the alert after the observation was stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    NotTriggered,
    Sent,
    Failed(String),
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub observation: PriceObservation,
    pub decision: AlertDecision,
    pub notification: NotificationOutcome,
}

/// Sender and recipient of alert mails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailRoute {
    pub to: String,
    pub from: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageTimeouts {
    pub render: Duration,
    pub persist: Duration,
    pub dispatch: Duration,
}

impl From<&TimeoutConfig> for StageTimeouts {
    fn from(config: &TimeoutConfig) -> Self {
        Self {
            render: config.render(),
            persist: config.persist(),
            dispatch: config.dispatch(),
        }
    }
}

#[derive(Error, Debug)]
enum NotifyError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

pub struct PriceMonitorPipeline {
    renderer: Arc<dyn PageRenderer>,
    store: Arc<dyn PriceHistoryStore>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    composer: NotificationComposer,
    selection: ListingSelection,
    mail: MailRoute,
    timeouts: StageTimeouts,
}

impl PriceMonitorPipeline {
    pub fn new(
        renderer: Arc<dyn PageRenderer>,
        store: Arc<dyn PriceHistoryStore>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        composer: NotificationComposer,
        selection: ListingSelection,
        mail: MailRoute,
        timeouts: StageTimeouts,
    ) -> Self {
        Self {
            renderer,
            store,
            dispatcher,
            composer,
            selection,
            mail,
            timeouts,
        }
    }

    /// Run every stage for `variant` once.
    pub async fn run(&self, variant: &ProductVariant) -> Result<RunReport, PipelineError> {
        let span = info_span!("variant_run", variant = %variant.id);
        let result = self.run_stages(variant).instrument(span.clone()).await;

        let _entered = span.enter();
        match &result {
            Ok(report) => info!(
                price = report.observation.price,
                notify = report.decision.should_notify,
                notification = ?report.notification,
                "Variant run completed"
            ),
            Err(e) => error!(stage = %e.stage, error = %e.source, "Variant run failed"),
        }
        result
    }

    async fn run_stages(&self, variant: &ProductVariant) -> Result<RunReport, PipelineError> {
        let fail = |stage: PipelineStage, source: StageError| PipelineError {
            variant: variant.id.clone(),
            stage,
            source,
        };

        debug!(stage = %PipelineStage::Rendering, url = %variant.inventory_url);
        let markup = self.render(variant).await.map_err(|e| fail(PipelineStage::Rendering, e.into()))?;

        debug!(stage = %PipelineStage::Extracting, bytes = markup.len());
        let observation = PriceExtractor::for_variant(variant, self.selection)
            .and_then(|extractor| extractor.extract(&variant.id, &markup))
            .map_err(|e| fail(PipelineStage::Extracting, e.into()))?;

        debug!(stage = %PipelineStage::Persisting, price = observation.price);
        self.persist(&observation)
            .await
            .map_err(|e| fail(PipelineStage::Persisting, e.into()))?;

        debug!(stage = %PipelineStage::Evaluating);
        let decision = AlertEvaluator::evaluate(&observation, variant.reference_price, &variant.inventory_url);

        let notification = if decision.should_notify {
            info!(
                price = observation.price,
                reference = variant.reference_price,
                "Price at or below reference, notifying"
            );
            debug!(stage = %PipelineStage::Notifying);
            match self.notify(variant, &decision).await {
                Ok(()) => NotificationOutcome::Sent,
                Err(e) => {
                    warn!(error = %e, "Notification failed; observation is already recorded");
                    NotificationOutcome::Failed(e.to_string())
                }
            }
        } else {
            info!(
                price = observation.price,
                reference = variant.reference_price,
                "Price above reference, no notification"
            );
            NotificationOutcome::NotTriggered
        };
        debug!(stage = %PipelineStage::Done);

        Ok(RunReport {
            observation,
            decision,
            notification,
        })
    }

    async fn render(&self, variant: &ProductVariant) -> Result<String, RenderError> {
        let url = &variant.inventory_url;
        with_deadline(self.timeouts.render, self.renderer.render(url, &variant.listing_path))
            .await
            .unwrap_or_else(|limit| {
                Err(RenderError::Timeout {
                    url: url.clone(),
                    limit,
                })
            })
    }

    async fn persist(&self, observation: &PriceObservation) -> Result<(), PersistenceError> {
        let write = async {
            self.store.ensure_schema(&observation.variant_id).await?;
            self.store.append(observation).await
        };
        with_deadline(self.timeouts.persist, write)
            .await
            .unwrap_or_else(|limit| Err(PersistenceError::Timeout(limit)))
    }

    async fn notify(&self, variant: &ProductVariant, decision: &AlertDecision) -> Result<(), NotifyError> {
        let fields = NotificationFields::from_decision(decision, &variant.label, &self.mail.to, &self.mail.from);
        let message = self.composer.compose(&fields)?;

        with_deadline(self.timeouts.dispatch, self.dispatcher.send(&message))
            .await
            .unwrap_or_else(|limit| Err(DeliveryError::Timeout(limit)))?;

        info!(to = %message.to, subject = %message.subject, "Notification sent");
        Ok(())
    }
}

/// Await `future`, or report the limit when it elapses first.
async fn with_deadline<F: Future>(limit: Duration, future: F) -> Result<F::Output, Duration> {
    timeout(limit, future).await.map_err(|_| limit)
}
