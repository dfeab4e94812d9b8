//! Re-scheduling on notification delivery.
//!
//! Bootstrap one-shots only become durable schedules when something runs
//! another pass after they fire. [`DeliveryHandler`] is that something: the
//! host forwards every received or tapped notification, and reminder
//! payloads trigger a pass with freshly loaded settings.

use crate::engine::{PassReport, ReminderEngine};
use crate::notifier::is_reminder_payload;
use crate::settings::SettingsProvider;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// How the notification reached the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryKind {
    /// Presented while the app was running.
    Received,
    /// The user tapped it.
    Tapped,
}

/// A delivered notification forwarded by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryEvent {
    pub kind: DeliveryKind,
    /// Payload attached when the trigger was registered.
    pub data: BTreeMap<String, String>,
}

impl DeliveryEvent {
    pub fn new(kind: DeliveryKind, data: BTreeMap<String, String>) -> Self {
        Self { kind, data }
    }
}

/// Runs a scheduling pass for delivered reminder notifications.
#[derive(Clone)]
pub struct DeliveryHandler {
    engine: Arc<ReminderEngine>,
    settings: Arc<dyn SettingsProvider>,
}

impl DeliveryHandler {
    pub fn new(engine: Arc<ReminderEngine>, settings: Arc<dyn SettingsProvider>) -> Self {
        Self { engine, settings }
    }

    /// Handle one delivery. Returns the pass report, or `None` when the
    /// payload is not a reminder or settings could not be loaded.
    pub fn handle(&self, event: &DeliveryEvent) -> Option<PassReport> {
        if !is_reminder_payload(&event.data) {
            debug!(kind = ?event.kind, "ignoring non-reminder notification");
            return None;
        }

        let settings = match self.settings.load_settings() {
            Ok(settings) => settings,
            Err(e) => {
                warn!("cannot load reminder settings after delivery: {e}");
                return None;
            }
        };

        debug!(
            kind = ?event.kind,
            category = ?event.data.get("category"),
            "reminder delivered, rescheduling"
        );
        Some(self.engine.schedule_reminders(&settings))
    }

    /// Consume delivery events until the sender side closes.
    pub fn spawn(
        self,
        mut events: mpsc::UnboundedReceiver<DeliveryEvent>,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            info!("reminder delivery listener started");
            while let Some(event) = events.recv().await {
                let handler = self.clone();
                let outcome = tokio::task::spawn_blocking(move || handler.handle(&event)).await;
                if let Err(e) = outcome {
                    warn!("reminder delivery handler panicked: {e}");
                }
            }
            debug!("reminder delivery channel closed, stopping");
        })
    }
}
