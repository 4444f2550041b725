//! GearHub: notification center and gear activity reporting service.
//!
//! The binary in `main.rs` wires configuration, storage and the HTTP router;
//! everything else lives here so integration tests in `tests/` can drive it.

use std::sync::Arc;

pub mod api;
pub mod center;
pub mod cli;
pub mod config;
pub mod errors;
pub mod models;
pub mod notification;
pub mod report;
pub mod store;

use notification::EmailSender;
use store::{InboxStore, NotificationProvider, UsageReportSource};

/// Shared application state passed to handlers and middleware.
pub struct AppState {
    pub inbox: Arc<dyn InboxStore>,
    pub provider: Arc<dyn NotificationProvider>,
    pub reports: Arc<dyn UsageReportSource>,
    pub mailer: Arc<dyn EmailSender>,
    pub config: config::Config,
}

impl AppState {
    /// State where one backend serves every data-access seam.
    pub fn with_store<S>(store: Arc<S>, mailer: Arc<dyn EmailSender>, config: config::Config) -> Self
    where
        S: InboxStore + NotificationProvider + UsageReportSource + 'static,
    {
        Self {
            inbox: store.clone(),
            provider: store.clone(),
            reports: store,
            mailer,
            config,
        }
    }
}
