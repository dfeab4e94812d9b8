//! Boundary over the host's local-notification trigger registry.
//!
//! The host adapter is the source of truth for what is scheduled. Cadence
//! only remembers trigger ids and recovers everything else (category label,
//! kind, fire time) from [`NotificationScheduler::list_all`].

use crate::error::{CadenceError, Result};
use crate::time::Weekday;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Payload key marking a notification as a reminder.
pub const PAYLOAD_TYPE_KEY: &str = "type";
/// Payload value for [`PAYLOAD_TYPE_KEY`].
pub const PAYLOAD_TYPE_REMINDER: &str = "reminder";
/// Payload key carrying the category id.
pub const PAYLOAD_CATEGORY_KEY: &str = "category";
/// Payload key set to `"true"` on bootstrap one-shots.
pub const PAYLOAD_BOOTSTRAP_KEY: &str = "bootstrap";

/// Opaque handle assigned by the host scheduler.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TriggerId(pub String);

impl TriggerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TriggerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Displayed notification content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContent {
    /// Title; for reminders this is the category label.
    pub title: String,
    pub body: String,
    /// Opaque payload handed back on delivery.
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

impl NotificationContent {
    /// Returns `true` when the payload tags this as a reminder.
    #[must_use]
    pub fn is_reminder(&self) -> bool {
        is_reminder_payload(&self.data)
    }
}

/// Returns `true` when a delivered payload belongs to a reminder.
#[must_use]
pub fn is_reminder_payload(data: &BTreeMap<String, String>) -> bool {
    data.get(PAYLOAD_TYPE_KEY).map(String::as_str) == Some(PAYLOAD_TYPE_REMINDER)
}

/// When a trigger fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerSpec {
    /// Fire once at an absolute instant.
    OneShot { at: DateTime<FixedOffset> },
    /// Fire every day (or every `weekday`) at `hour:minute` local time.
    Repeating {
        hour: u8,
        minute: u8,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        weekday: Option<Weekday>,
        /// Timezone the wall-clock time is anchored to.
        timezone: String,
    },
}

impl TriggerSpec {
    #[must_use]
    pub fn is_one_shot(&self) -> bool {
        matches!(self, Self::OneShot { .. })
    }
}

/// A live trigger as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledNotification {
    pub id: TriggerId,
    pub content: NotificationContent,
    pub trigger: TriggerSpec,
}

/// Host notification permission state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

/// Host capability for registering local notification triggers.
pub trait NotificationScheduler: Send + Sync {
    /// Current permission state.
    fn permission(&self) -> Result<Permission>;

    /// Register a trigger and return its id.
    fn schedule(&self, content: NotificationContent, trigger: TriggerSpec) -> Result<TriggerId>;

    /// Cancel a trigger. Unknown ids are not an error.
    fn cancel(&self, id: &TriggerId) -> Result<()>;

    /// Every live trigger.
    fn list_all(&self) -> Result<Vec<ScheduledNotification>>;
}

#[derive(Debug, Default)]
struct InMemoryState {
    live: Vec<ScheduledNotification>,
    next_id: u64,
    schedule_calls: usize,
    cancel_calls: usize,
    denied: bool,
    failing_title: Option<String>,
}

/// In-process trigger registry.
///
/// Used by tests and the dry-run binary, and as the registry on hosts with no
/// native notification support. Ids are sequential (`"n1"`, `"n2"`, ...).
#[derive(Debug, Default)]
pub struct InMemoryScheduler {
    state: Mutex<InMemoryState>,
}

impl InMemoryScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, InMemoryState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Snapshot of live triggers in registration order.
    #[must_use]
    pub fn live(&self) -> Vec<ScheduledNotification> {
        self.lock().live.clone()
    }

    /// Number of `schedule` calls so far.
    #[must_use]
    pub fn schedule_calls(&self) -> usize {
        self.lock().schedule_calls
    }

    /// Number of `cancel` calls so far.
    #[must_use]
    pub fn cancel_calls(&self) -> usize {
        self.lock().cancel_calls
    }

    /// Toggle permission denial.
    pub fn set_denied(&self, denied: bool) {
        self.lock().denied = denied;
    }

    /// Make `schedule` fail for content with this title.
    pub fn fail_title(&self, title: Option<String>) {
        self.lock().failing_title = title;
    }

    /// Register a trigger directly, bypassing call counters.
    pub fn seed(&self, content: NotificationContent, trigger: TriggerSpec) -> TriggerId {
        let mut state = self.lock();
        state.next_id += 1;
        let id = TriggerId(format!("n{}", state.next_id));
        state.live.push(ScheduledNotification {
            id: id.clone(),
            content,
            trigger,
        });
        id
    }
}

impl NotificationScheduler for InMemoryScheduler {
    fn permission(&self) -> Result<Permission> {
        Ok(if self.lock().denied {
            Permission::Denied
        } else {
            Permission::Granted
        })
    }

    fn schedule(&self, content: NotificationContent, trigger: TriggerSpec) -> Result<TriggerId> {
        {
            let mut state = self.lock();
            state.schedule_calls += 1;
            if state.denied {
                return Err(CadenceError::PermissionDenied);
            }
            if state.failing_title.as_deref() == Some(content.title.as_str()) {
                return Err(CadenceError::Scheduler(format!(
                    "host rejected trigger for {}",
                    content.title
                )));
            }
        }
        Ok(self.seed(content, trigger))
    }

    fn cancel(&self, id: &TriggerId) -> Result<()> {
        let mut state = self.lock();
        state.cancel_calls += 1;
        state.live.retain(|n| &n.id != id);
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<ScheduledNotification>> {
        Ok(self.lock().live.clone())
    }
}
