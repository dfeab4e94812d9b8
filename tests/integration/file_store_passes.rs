//! Engine passes over the file-backed store, as a host restart would see them.

use crate::helpers::{engine_at, journal_only};
use cadence::{JsonFileStore, KeyValueStore, PassOutcome, ReminderPreference, TriggerStore, Weekday};
use std::sync::Arc;

#[test]
fn bookkeeping_survives_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("triggers.json");
    let settings = journal_only(ReminderPreference::custom([
        (Weekday::Tuesday, "19:00"),
        (Weekday::Thursday, "19:00"),
    ]));

    let t = engine_at("2026-03-04T10:00:00+00:00", Arc::new(JsonFileStore::new(path.clone())));
    let first = t.engine.schedule_reminders(&settings);
    assert_eq!(first.outcome, PassOutcome::FullPass);

    let store = JsonFileStore::new(path.clone());
    let tracked = TriggerStore::load(&store, "reminders", ["journal"]);
    assert_eq!(tracked.tracked("journal").len(), 2);
    assert!(tracked.last_signature.is_some());

    // Same registry contents, fresh engine over the same file.
    let restarted = cadence::ReminderEngine::new(t.registry.clone(), Arc::new(store))
        .with_clock(t.clock.clone());
    let second = restarted.schedule_reminders(&settings);
    assert_eq!(second.outcome, PassOutcome::Skipped);
}

#[test]
fn corrupt_store_forces_full_pass() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("triggers.json");
    std::fs::write(&path, "{ definitely not json").expect("write corrupt store");

    let store = JsonFileStore::new(path.clone());
    assert!(store.get("reminders.signature").is_err());

    let t = engine_at("2026-03-04T10:00:00+00:00", Arc::new(store));
    let friday = journal_only(ReminderPreference::custom([(Weekday::Friday, "08:00")]));
    let report = t.engine.schedule_reminders(&friday);
    assert_eq!(report.outcome, PassOutcome::FullPass);
    // Writes fail against the unparsable file, so the category is reported
    // and its registration is undone rather than left untracked.
    assert_eq!(report.failed_categories, vec!["journal".to_owned()]);
    assert!(report.records.is_empty());
    assert!(t.registry.live().is_empty());
    assert_eq!(t.registry.schedule_calls(), 1);
}
