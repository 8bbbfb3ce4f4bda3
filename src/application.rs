//! Application layer module
//!
//! Orchestrates the domain and infrastructure pieces: one pipeline run per
//! variant, and the runner that drives all variants of the catalog.

pub mod pipeline;
pub mod runner;

pub use pipeline::{
    MailRoute, NotificationOutcome, PipelineError, PipelineStage, PriceMonitorPipeline, RunReport, StageError,
    StageTimeouts,
};
pub use runner::{MonitorRunner, RunSummary, VariantRunResult};
