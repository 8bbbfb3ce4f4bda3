//! End-to-end pipeline scenarios
//!
//! Real SQLite price history in a temp directory; renderer and mail
//! dispatcher are in-memory fakes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use price_monitor_lib::application::{
    MailRoute, MonitorRunner, NotificationOutcome, PipelineStage, PriceMonitorPipeline, StageError, StageTimeouts,
};
use price_monitor_lib::domain::{
    DeliveryError, NotificationDispatcher, NotificationMessage, PageRenderer, PersistenceError, PriceHistoryStore,
    PriceObservation, ProductVariant, RenderError, VariantCatalog, VariantId,
};
use price_monitor_lib::infrastructure::config::DatabaseConfig;
use price_monitor_lib::infrastructure::parsing::ListingSelection;
use price_monitor_lib::infrastructure::{
    DatabaseConnection, NotificationComposer, ParsingError, SqlPriceHistoryRepository,
};
use tempfile::TempDir;

const LISTING: &str = "main article.result";
const PRICE: &str = "span.result-purchase-price";

fn inventory_page(prices: &[&str]) -> String {
    let articles: String = prices
        .iter()
        .map(|price| {
            format!(
                r#"<article class="result card"><section><div><div><span class="result-purchase-price">{price}</span></div></div></section></article>"#
            )
        })
        .collect();
    format!("<html><body><div><main><div>{articles}</div></main></div></body></html>")
}

/// Serves canned markup per URL; unknown URLs fail like a browser crash.
#[derive(Default)]
struct FakeRenderer {
    pages: HashMap<String, String>,
}

impl FakeRenderer {
    fn with_page(mut self, url: &str, markup: String) -> Self {
        self.pages.insert(url.to_string(), markup);
        self
    }
}

#[async_trait]
impl PageRenderer for FakeRenderer {
    async fn render(&self, url: &str, _ready_selector: &str) -> Result<String, RenderError> {
        self.pages.get(url).cloned().ok_or_else(|| RenderError::Browser {
            url: url.to_string(),
            message: "target crashed".to_string(),
        })
    }
}

/// Never finishes rendering.
struct HangingRenderer;

#[async_trait]
impl PageRenderer for HangingRenderer {
    async fn render(&self, _url: &str, _ready_selector: &str) -> Result<String, RenderError> {
        futures::future::pending().await
    }
}

/// Waits out its readiness window, then hands back whatever the page holds.
struct GiveUpWaitingRenderer {
    ready_window: Duration,
    markup: String,
}

#[async_trait]
impl PageRenderer for GiveUpWaitingRenderer {
    async fn render(&self, _url: &str, _ready_selector: &str) -> Result<String, RenderError> {
        tokio::time::sleep(self.ready_window).await;
        Ok(self.markup.clone())
    }
}

#[derive(Default)]
struct RecordingDispatcher {
    sent: Mutex<Vec<NotificationMessage>>,
    fail: bool,
}

impl RecordingDispatcher {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn sent(&self) -> Vec<NotificationMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn send(&self, message: &NotificationMessage) -> Result<(), DeliveryError> {
        if self.fail {
            return Err(DeliveryError::Smtp("421 service not available".to_string()));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Accepts the schema but refuses every insert.
struct FailingStore;

#[async_trait]
impl PriceHistoryStore for FailingStore {
    async fn ensure_schema(&self, _variant_id: &VariantId) -> Result<(), PersistenceError> {
        Ok(())
    }

    async fn append(&self, _observation: &PriceObservation) -> Result<(), PersistenceError> {
        Err(PersistenceError::Connection("connection reset by peer".to_string()))
    }

    async fn recent(&self, _variant_id: &VariantId, _limit: u32) -> Result<Vec<PriceObservation>, PersistenceError> {
        Ok(Vec::new())
    }
}

fn variant(id: &str, reference_price: f64) -> ProductVariant {
    let id = VariantId::parse(id).unwrap();
    ProductVariant {
        label: id.default_label(),
        inventory_url: format!("https://shop.example.com/inventory/{id}"),
        listing_path: LISTING.to_string(),
        price_path: PRICE.to_string(),
        reference_price,
        id,
    }
}

async fn sqlite_store() -> (TempDir, DatabaseConnection, Arc<SqlPriceHistoryRepository>) {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = DatabaseConfig {
        url: format!("sqlite://{}", temp_dir.path().join("prices.db").display()),
        ..DatabaseConfig::default()
    };
    let connection = DatabaseConnection::new(&config).await.unwrap();
    let store = Arc::new(SqlPriceHistoryRepository::new(&connection));
    (temp_dir, connection, store)
}

fn timeouts() -> StageTimeouts {
    StageTimeouts {
        render: Duration::from_secs(5),
        persist: Duration::from_secs(5),
        dispatch: Duration::from_secs(5),
    }
}

fn pipeline(
    renderer: Arc<dyn PageRenderer>,
    store: Arc<dyn PriceHistoryStore>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    timeouts: StageTimeouts,
) -> PriceMonitorPipeline {
    PriceMonitorPipeline::new(
        renderer,
        store,
        dispatcher,
        NotificationComposer::from_template_source(None).unwrap(),
        ListingSelection::First,
        MailRoute {
            to: "tmp@example.com".to_string(),
            from: "bot@example.com".to_string(),
        },
        timeouts,
    )
}

#[tokio::test]
async fn test_price_below_reference_is_recorded_and_notified() {
    let model_y = variant("model_y", 36500.0);
    let renderer = FakeRenderer::default().with_page(&model_y.inventory_url, inventory_page(&["35.990 €", "41.200 €"]));
    let (_dir, _connection, store) = sqlite_store().await;
    let dispatcher = Arc::new(RecordingDispatcher::default());

    let report = pipeline(Arc::new(renderer), store.clone(), dispatcher.clone(), timeouts())
        .run(&model_y)
        .await
        .unwrap();

    assert_eq!(report.observation.price, 35990.0);
    assert!(report.decision.should_notify);
    assert_eq!(report.notification, NotificationOutcome::Sent);

    let history = store.recent(&model_y.id, 10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].price, 35990.0);

    let sent = dispatcher.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "tmp@example.com");
    assert_eq!(sent[0].subject, "Price Alert - MODEL_Y new article!");
    assert!(sent[0].body.contains("35990"));
    assert!(sent[0].body.contains("36500"));
    assert!(sent[0].body.contains(&model_y.inventory_url));
}

#[tokio::test]
async fn test_price_above_reference_is_recorded_without_notification() {
    let model_y = variant("model_y", 30000.0);
    let renderer = FakeRenderer::default().with_page(&model_y.inventory_url, inventory_page(&["35.990 €"]));
    let (_dir, _connection, store) = sqlite_store().await;
    let dispatcher = Arc::new(RecordingDispatcher::default());

    let report = pipeline(Arc::new(renderer), store.clone(), dispatcher.clone(), timeouts())
        .run(&model_y)
        .await
        .unwrap();

    assert!(!report.decision.should_notify);
    assert_eq!(report.notification, NotificationOutcome::NotTriggered);
    assert_eq!(store.recent(&model_y.id, 10).await.unwrap().len(), 1);
    assert!(dispatcher.sent().is_empty());
}

#[tokio::test]
async fn test_failed_append_never_notifies() {
    let model_y = variant("model_y", 36500.0);
    let renderer = FakeRenderer::default().with_page(&model_y.inventory_url, inventory_page(&["35.990 €"]));
    let dispatcher = Arc::new(RecordingDispatcher::default());

    let err = pipeline(Arc::new(renderer), Arc::new(FailingStore), dispatcher.clone(), timeouts())
        .run(&model_y)
        .await
        .unwrap_err();

    assert_eq!(err.stage, PipelineStage::Persisting);
    assert!(matches!(err.source, StageError::Persistence(_)));
    assert!(dispatcher.sent().is_empty());
}

#[tokio::test]
async fn test_empty_inventory_fails_extraction_and_records_nothing() {
    let model_y = variant("model_y", 36500.0);
    let renderer = FakeRenderer::default().with_page(
        &model_y.inventory_url,
        "<html><body><main><p>No results</p></main></body></html>".to_string(),
    );
    let (_dir, _connection, store) = sqlite_store().await;
    store.ensure_schema(&model_y.id).await.unwrap();
    let dispatcher = Arc::new(RecordingDispatcher::default());

    let err = pipeline(Arc::new(renderer), store.clone(), dispatcher.clone(), timeouts())
        .run(&model_y)
        .await
        .unwrap_err();

    assert_eq!(err.stage, PipelineStage::Extracting);
    assert!(matches!(err.source, StageError::Extraction(ParsingError::NodeNotFound { .. })));
    assert!(store.recent(&model_y.id, 10).await.unwrap().is_empty());
    assert!(dispatcher.sent().is_empty());
}

#[tokio::test]
async fn test_listing_that_never_appears_is_an_extraction_failure() {
    let model_y = variant("model_y", 36500.0);
    let renderer = GiveUpWaitingRenderer {
        ready_window: Duration::from_millis(50),
        markup: "<html><body><main><div class=\"empty-state\"></div></main></body></html>".to_string(),
    };
    let (_dir, _connection, store) = sqlite_store().await;
    store.ensure_schema(&model_y.id).await.unwrap();

    let err = pipeline(Arc::new(renderer), store.clone(), Arc::new(RecordingDispatcher::default()), timeouts())
        .run(&model_y)
        .await
        .unwrap_err();

    assert_eq!(err.stage, PipelineStage::Extracting);
    assert!(matches!(
        err.source,
        StageError::Extraction(ParsingError::NodeNotFound { ref path, .. }) if path == LISTING
    ));
    assert!(store.recent(&model_y.id, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delivery_failure_keeps_the_observation() {
    let model_y = variant("model_y", 36500.0);
    let renderer = FakeRenderer::default().with_page(&model_y.inventory_url, inventory_page(&["35.990 €"]));
    let (_dir, _connection, store) = sqlite_store().await;

    let report = pipeline(Arc::new(renderer), store.clone(), Arc::new(RecordingDispatcher::failing()), timeouts())
        .run(&model_y)
        .await
        .unwrap();

    assert!(matches!(report.notification, NotificationOutcome::Failed(ref reason) if reason.contains("421")));
    assert_eq!(store.recent(&model_y.id, 10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_render_deadline_is_enforced() {
    let model_y = variant("model_y", 36500.0);
    let (_dir, _connection, store) = sqlite_store().await;
    let short = StageTimeouts {
        render: Duration::from_millis(50),
        ..timeouts()
    };

    let err = pipeline(Arc::new(HangingRenderer), store, Arc::new(RecordingDispatcher::default()), short)
        .run(&model_y)
        .await
        .unwrap_err();

    assert_eq!(err.stage, PipelineStage::Rendering);
    assert!(matches!(err.source, StageError::Render(RenderError::Timeout { .. })));
}

#[tokio::test]
async fn test_one_failing_variant_does_not_abort_the_other() {
    for parallel in [false, true] {
        let model_y = variant("model_y", 36500.0);
        let model_3 = variant("model_3", 36500.0);
        // model_3 has no page: its render fails
        let renderer = FakeRenderer::default().with_page(&model_y.inventory_url, inventory_page(&["35.990 €"]));
        let (_dir, _connection, store) = sqlite_store().await;
        let dispatcher = Arc::new(RecordingDispatcher::default());

        let catalog: VariantCatalog = [model_y.clone(), model_3.clone()].into_iter().collect();
        let runner = MonitorRunner::new(
            pipeline(Arc::new(renderer), store.clone(), dispatcher.clone(), timeouts()),
            parallel,
        );
        let summary = runner.run(&catalog).await;

        assert_eq!(summary.completed(), 1);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.exit_code(), 1);
        assert_eq!(store.recent(&model_y.id, 10).await.unwrap().len(), 1);
        assert_eq!(dispatcher.sent().len(), 1);

        let failure = summary
            .results
            .iter()
            .find(|r| r.variant == model_3.id)
            .and_then(|r| r.outcome.as_ref().err())
            .unwrap();
        assert_eq!(failure.stage, PipelineStage::Rendering);
    }
}

#[tokio::test]
async fn test_repeated_runs_append_one_observation_each() {
    let model_y = variant("model_y", 30000.0);
    let renderer = Arc::new(FakeRenderer::default().with_page(&model_y.inventory_url, inventory_page(&["35.990 €"])));
    let (_dir, _connection, store) = sqlite_store().await;
    let pipeline = pipeline(renderer, store.clone(), Arc::new(RecordingDispatcher::default()), timeouts());

    for _ in 0..3 {
        pipeline.run(&model_y).await.unwrap();
    }

    let history = store.recent(&model_y.id, 10).await.unwrap();
    assert_eq!(history.len(), 3);
    assert!(history.windows(2).all(|w| w[0].observed_at <= w[1].observed_at));
}
