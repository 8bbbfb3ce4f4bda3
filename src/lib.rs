//! Price Monitor - storefront price tracking with mail alerts
//!
//! Renders a client-side storefront inventory page, extracts the listing price,
//! appends it to a per-variant time series and mails an alert when the price
//! drops to or below a reference price.

// Module declarations
pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{error, info, warn};

use application::{MailRoute, MonitorRunner, PriceMonitorPipeline, StageTimeouts};
use cli::{Cli, Command, HistoryArgs, RunArgs};
use domain::{PriceHistoryStore, VariantId};
use infrastructure::{
    AppConfig, DatabaseConnection, NotificationComposer, SmtpNotificationDispatcher, SqlPriceHistoryRepository,
    build_page_renderer, init_logging_with_config,
};

/// Conventional status for a run stopped by Ctrl-C
const INTERRUPTED_EXIT_CODE: u8 = 130;

/// Process entry point: parse the command line, execute, map to an exit status.
pub async fn run() -> ExitCode {
    let cli = Cli::parse();
    match execute(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("❌ {e:#}");
            eprintln!("price-monitor: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> Result<ExitCode> {
    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    init_logging_with_config(&config.logging)?;
    info!(version = env!("CARGO_PKG_VERSION"), "Price monitor starting");

    match cli.into_command() {
        Command::Run(args) => run_monitor(&config, &args).await,
        Command::History(args) => print_history(&config, &args).await,
    }
}

async fn run_monitor(config: &AppConfig, args: &RunArgs) -> Result<ExitCode> {
    let mut catalog = config.variant_catalog()?;
    let requested = args
        .variants
        .iter()
        .map(|raw| VariantId::parse(raw))
        .collect::<Result<Vec<_>, _>>()?;
    if let Some(unknown) = requested.iter().find(|id| catalog.get(id).is_none()) {
        bail!("Variant '{unknown}' is not configured or not enabled");
    }
    catalog.retain_ids(&requested);

    let composer = NotificationComposer::from_template_source(config.mail.template.as_deref())
        .context("Invalid notification template")?;
    let renderer = build_page_renderer(&config.renderer)?;
    let dispatcher = Arc::new(SmtpNotificationDispatcher::from_url(
        &config.smtp_url(),
        config.timeouts.dispatch(),
    )?);

    let database = DatabaseConnection::new(&config.database)
        .await
        .context("Failed to open the price history database")?;
    let store = Arc::new(SqlPriceHistoryRepository::new(&database));

    let pipeline = PriceMonitorPipeline::new(
        renderer,
        store,
        dispatcher,
        composer,
        config.extraction.selection,
        MailRoute {
            to: config.mail.to.clone(),
            from: config.mail.from.clone(),
        },
        StageTimeouts::from(&config.timeouts),
    );
    let runner = MonitorRunner::new(pipeline, args.parallel || config.run.parallel);

    let exit_code = tokio::select! {
        summary = runner.run(&catalog) => {
            summary.log();
            summary.exit_status()
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, shutting down");
            ExitCode::from(INTERRUPTED_EXIT_CODE)
        }
    };

    database.close().await;
    Ok(exit_code)
}

async fn print_history(config: &AppConfig, args: &HistoryArgs) -> Result<ExitCode> {
    let variant = VariantId::parse(&args.variant)?;

    let database = DatabaseConnection::new(&config.database)
        .await
        .context("Failed to open the price history database")?;
    let store = SqlPriceHistoryRepository::new(&database);
    let history = store.recent(&variant, args.limit).await;
    database.close().await;

    let history = history.with_context(|| format!("Failed to read the history of '{variant}'"))?;
    if args.json {
        for observation in &history {
            println!("{}", serde_json::to_string(observation)?);
        }
    } else if history.is_empty() {
        println!("No observations recorded for {variant}");
    } else {
        for observation in &history {
            println!("{}\t{}", observation.observed_at.format("%Y-%m-%d %H:%M:%S"), observation.price);
        }
    }
    Ok(ExitCode::SUCCESS)
}
