//! Alert notification: template composition and mail delivery

pub mod composer;
pub mod smtp_dispatcher;

pub use composer::{DEFAULT_TEMPLATE, NotificationComposer, NotificationFields, NotificationTemplate, TemplateError};
pub use smtp_dispatcher::{SmtpNotificationDispatcher, SmtpSecurity, SmtpSettings};
