//! Shared helpers for integration tests.

use cadence::{
    CategorySettings, FixedClock, InMemoryScheduler, KeyValueStore, MemoryStore, ReminderCategory,
    ReminderEngine, ReminderPreference, ReminderSettings,
};
use chrono::{DateTime, FixedOffset};
use std::sync::Arc;

/// Engine wired to in-memory adapters and a fixed clock.
pub(crate) struct TestEngine {
    pub registry: Arc<InMemoryScheduler>,
    pub clock: Arc<FixedClock>,
    pub engine: Arc<ReminderEngine>,
}

pub(crate) fn instant(text: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(text).expect("valid RFC 3339 instant")
}

/// Build an engine at `now` over `store`.
pub(crate) fn engine_at(now: &str, store: Arc<dyn KeyValueStore>) -> TestEngine {
    let registry = Arc::new(InMemoryScheduler::new());
    let clock = Arc::new(FixedClock::new(instant(now)));
    let engine = Arc::new(ReminderEngine::new(registry.clone(), store).with_clock(clock.clone()));
    TestEngine {
        registry,
        clock,
        engine,
    }
}

/// Build an engine at `now` over a fresh memory store.
pub(crate) fn memory_engine_at(now: &str) -> TestEngine {
    engine_at(now, Arc::new(MemoryStore::new()))
}

/// Settings with only the mood category on `pref`.
pub(crate) fn mood_only(pref: ReminderPreference) -> ReminderSettings {
    ReminderSettings::default().with_category(CategorySettings::new(ReminderCategory::mood(), pref))
}

/// Settings with only the journal category on `pref`.
pub(crate) fn journal_only(pref: ReminderPreference) -> ReminderSettings {
    ReminderSettings::default()
        .with_category(CategorySettings::new(ReminderCategory::journal(), pref))
}
