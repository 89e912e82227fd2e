//! Best-effort notifications
//!
//! Notifications are sent after the write they describe has committed. They
//! run on a detached task, are never retried, and a failure only produces a
//! warning in the log.

use async_trait::async_trait;
use parking_core::{Contact, Permit, Ticket};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

/// What happened, for whom
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    PermitIssued { recipient: Contact, permit: Permit },
    TicketIssued { recipient: Contact, ticket: Ticket },
    TicketPaid { recipient: Contact, ticket: Ticket },
}

impl Notification {
    pub fn recipient(&self) -> &Contact {
        match self {
            Notification::PermitIssued { recipient, .. }
            | Notification::TicketIssued { recipient, .. }
            | Notification::TicketPaid { recipient, .. } => recipient,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Notification::PermitIssued { .. } => "permit_issued",
            Notification::TicketIssued { .. } => "ticket_issued",
            Notification::TicketPaid { .. } => "ticket_paid",
        }
    }
}

/// Delivery channel for notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Writes notifications to the log instead of delivering them
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        info!(
            kind = notification.kind(),
            recipient = %notification.recipient().principal_id,
            "Notification"
        );
        Ok(())
    }
}

/// POSTs each notification as JSON to a mail relay webhook
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .json(notification)
            .send()
            .await
            .map_err(|e| NotifyError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotifyError(format!("webhook returned {}", response.status())));
        }
        Ok(())
    }
}

/// Run `build` then send its notification on a detached task
///
/// `build` may itself need a lookup (e.g. the vehicle owner's contact). A
/// lookup failure or a missing recipient is logged and dropped the same way a
/// delivery failure is.
pub fn dispatch<F>(notifier: Arc<dyn Notifier>, build: F)
where
    F: Future<Output = Result<Option<Notification>, NotifyError>> + Send + 'static,
{
    tokio::spawn(async move {
        let notification = match build.await {
            Ok(Some(notification)) => notification,
            Ok(None) => {
                warn!("Notification skipped: no recipient");
                return;
            }
            Err(e) => {
                warn!(error = %e, "Notification skipped");
                return;
            }
        };

        if let Err(e) = notifier.send(&notification).await {
            warn!(kind = notification.kind(), error = %e, "Notification delivery failed");
        }
    });
}
