//! Best-effort notification dispatch. Punch events are emitted here
//! fire-and-forget; a dispatch failure never reaches the punch pipeline's
//! caller.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    /// Random v4 id identifying the event.
    pub id: String,
    /// Domain event kind, e.g. "punch_in" / "punch_out".
    pub kind: String,
    pub title: String,
    pub message: String,
    pub target_roles: Vec<String>,
    pub employee_id: u64,
    /// Navigation link for the receiving client.
    pub link: String,
}

#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, notification: Notification) -> Result<()>;
}

/// Default dispatcher: writes the event to the log stream. Deployments that
/// deliver through an external channel drop their own impl in at `main`.
#[derive(Debug, Default)]
pub struct LogDispatcher;

#[async_trait]
impl NotificationDispatcher for LogDispatcher {
    async fn dispatch(&self, notification: Notification) -> Result<()> {
        tracing::info!(
            id = %notification.id,
            kind = %notification.kind,
            employee_id = notification.employee_id,
            link = %notification.link,
            "{}",
            notification.message
        );
        Ok(())
    }
}

/// Spawns the dispatch so the caller never waits on it; failures are logged
/// and swallowed.
pub fn dispatch_fire_and_forget(
    dispatcher: std::sync::Arc<dyn NotificationDispatcher>,
    notification: Notification,
) {
    actix_web::rt::spawn(async move {
        let kind = notification.kind.clone();
        if let Err(e) = dispatcher.dispatch(notification).await {
            tracing::warn!(error = %e, %kind, "notification dispatch failed");
        }
    });
}
