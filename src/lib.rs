//! Cadence: local reminder scheduling engine.
//!
//! Turns per-category reminder preferences ("mood check-in daily at 09:00",
//! "journal on Mon/Wed/Fri evenings") into triggers registered with the
//! host's local-notification scheduler, without duplicate firings, stale
//! triggers or needless re-registration across repeated invocations.
//!
//! # Architecture
//!
//! - **Store** ([`store`]): durable key-value adapter holding tracked ids
//!   and the last applied signature
//! - **Notifier** ([`notifier`]): boundary over the host trigger registry
//! - **Signature** ([`signature`]): skips passes when nothing changed
//! - **Sweeper** ([`sweeper`]): cancels stale one-shots and orphans
//! - **Planner** ([`planner`]): per-category past/near/future planning
//! - **Auditor** ([`auditor`]): caps live triggers per label
//! - **Engine** ([`engine`]): orchestrates a pass under a single-flight lock
//! - **Delivery** ([`delivery`]): re-runs the engine when reminders fire

pub mod auditor;
pub mod cadence_dirs;
pub mod clock;
pub mod config;
pub mod delivery;
pub mod engine;
pub mod error;
pub mod notifier;
pub mod planner;
pub mod settings;
pub mod signature;
pub mod store;
pub mod sweeper;
pub mod time;

pub use clock::{Clock, DeviceZone, FixedClock, SystemClock};
pub use config::EngineConfig;
pub use delivery::{DeliveryEvent, DeliveryHandler, DeliveryKind};
pub use engine::{PassOutcome, PassReport, ReminderEngine};
pub use error::{CadenceError, Result};
pub use notifier::{InMemoryScheduler, NotificationScheduler, TriggerId, TriggerSpec};
pub use settings::{
    CategorySettings, FrequencyMode, ReminderCategory, ReminderPreference, ReminderSettings,
    SettingsProvider,
};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, TriggerStore};
pub use time::{TimeOfDay, Weekday};
