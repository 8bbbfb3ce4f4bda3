//! Infrastructure layer for configuration, logging, persistence, parsing,
//! rendering and mail delivery
//!
//! Concrete implementations of the collaborator traits declared in `domain`.

pub mod config; // Layered configuration and defaults
pub mod database_connection;
pub mod logging; // Logging infrastructure
pub mod notification;
pub mod page_renderer;
pub mod parsing; // Price text normalization and extraction
pub mod parsing_error;
pub mod price_history_repository;

// Re-export commonly used items
pub use config::{AppConfig, ConfigError};
pub use database_connection::DatabaseConnection;
pub use logging::{get_log_directory, init_logging_with_config};
pub use notification::{NotificationComposer, SmtpNotificationDispatcher, TemplateError};
pub use page_renderer::{BrowserPageRenderer, HttpPageRenderer, build_page_renderer};
pub use parsing::{ParsingError, ParsingResult, PriceExtractor, PriceTextNormalizer};
pub use price_history_repository::SqlPriceHistoryRepository;
