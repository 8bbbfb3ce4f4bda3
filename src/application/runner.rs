//! Runs the pipeline once for every tracked variant
//!
//! Variant runs share nothing but the store and the dispatcher, so one
//! variant failing never stops another.

use std::process::ExitCode;

use futures::future::join_all;
use tracing::{error, info, warn};

use super::pipeline::{NotificationOutcome, PipelineError, PriceMonitorPipeline, RunReport};
use crate::domain::{VariantCatalog, VariantId};

/// Outcome of a single variant run.
#[derive(Debug)]
pub struct VariantRunResult {
    pub variant: VariantId,
    pub outcome: Result<RunReport, PipelineError>,
}

impl VariantRunResult {
    fn notification_failed(&self) -> bool {
        matches!(
            &self.outcome,
            Ok(RunReport {
                notification: NotificationOutcome::Failed(_),
                ..
            })
        )
    }
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub results: Vec<VariantRunResult>,
}

impl RunSummary {
    pub fn completed(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.completed()
    }

    pub fn notifications_sent(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(&r.outcome, Ok(report) if report.notification == NotificationOutcome::Sent))
            .count()
    }

    pub fn notification_failures(&self) -> usize {
        self.results.iter().filter(|r| r.notification_failed()).count()
    }

    /// 0: all runs completed and every alert went out.
    /// 1: at least one run failed.
    /// 2: all runs completed but an alert could not be delivered.
    pub fn exit_code(&self) -> u8 {
        if self.failed() > 0 {
            1
        } else if self.notification_failures() > 0 {
            2
        } else {
            0
        }
    }

    pub fn exit_status(&self) -> ExitCode {
        ExitCode::from(self.exit_code())
    }

    pub fn log(&self) {
        for result in &self.results {
            match &result.outcome {
                Ok(report) => info!(
                    variant = %result.variant,
                    price = report.observation.price,
                    reference = report.decision.reference_price,
                    notification = ?report.notification,
                    "✅ Variant completed"
                ),
                Err(e) => error!(variant = %result.variant, stage = %e.stage, "❌ {}", e),
            }
        }

        let summary = format!(
            "{} completed, {} failed, {} alerts sent, {} alerts failed",
            self.completed(),
            self.failed(),
            self.notifications_sent(),
            self.notification_failures()
        );
        if self.exit_code() == 0 {
            info!("📊 Run summary: {summary}");
        } else {
            warn!("📊 Run summary: {summary}");
        }
    }
}

pub struct MonitorRunner {
    pipeline: PriceMonitorPipeline,
    parallel: bool,
}

impl MonitorRunner {
    pub const fn new(pipeline: PriceMonitorPipeline, parallel: bool) -> Self {
        Self { pipeline, parallel }
    }

    /// Run every variant of the catalog, in catalog order.
    pub async fn run(&self, catalog: &VariantCatalog) -> RunSummary {
        info!(variants = catalog.len(), parallel = self.parallel, "🚀 Starting price monitor run");

        let results = if self.parallel {
            join_all(catalog.iter().map(|variant| async move {
                VariantRunResult {
                    variant: variant.id.clone(),
                    outcome: self.pipeline.run(variant).await,
                }
            }))
            .await
        } else {
            let mut results = Vec::with_capacity(catalog.len());
            for variant in catalog.iter() {
                results.push(VariantRunResult {
                    variant: variant.id.clone(),
                    outcome: self.pipeline.run(variant).await,
                });
            }
            results
        };

        RunSummary { results }
    }
}
