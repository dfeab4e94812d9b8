//! End-to-end checks of the scheduling rules through the public engine API.
//!
//! The fixed clock sits on Wednesday 2026-03-04 10:00:00 +02:00 unless a test
//! says otherwise.

use crate::helpers::{instant, journal_only, memory_engine_at, mood_only};
use cadence::notifier::NotificationContent;
use cadence::planner::TriggerKind;
use cadence::signature::signature_of;
use cadence::{
    CategorySettings, FixedClock, InMemoryScheduler, MemoryStore, PassOutcome, ReminderCategory,
    ReminderEngine, ReminderPreference, TriggerSpec, Weekday,
};
use std::collections::BTreeMap;
use std::sync::Arc;

const NOW: &str = "2026-03-04T10:00:00+02:00";

fn titled(title: &str) -> NotificationContent {
    NotificationContent {
        title: title.to_owned(),
        body: String::new(),
        data: BTreeMap::new(),
    }
}

#[test]
fn repeated_identical_pass_is_a_no_op() {
    let t = memory_engine_at(NOW);
    let settings = journal_only(ReminderPreference::custom([
        (Weekday::Monday, "08:00"),
        (Weekday::Wednesday, "21:00"),
        (Weekday::Saturday, "11:30"),
    ]));

    let first = t.engine.schedule_reminders(&settings);
    assert_eq!(first.outcome, PassOutcome::FullPass);
    let schedules = t.registry.schedule_calls();
    let cancels = t.registry.cancel_calls();

    let second = t.engine.schedule_reminders(&settings);
    assert_eq!(second.outcome, PassOutcome::Skipped);
    assert_eq!(second.trimmed, 0);
    assert_eq!(t.registry.schedule_calls(), schedules);
    assert_eq!(t.registry.cancel_calls(), cancels);
}

#[test]
fn signature_ignores_insertion_order() {
    let mut a = ReminderPreference::custom(Vec::<(Weekday, &str)>::new());
    for (day, time) in [(Weekday::Sunday, "10:00"), (Weekday::Tuesday, "07:45")] {
        a.custom_schedule.insert(day, time.to_owned());
    }
    let mut b = ReminderPreference::custom(Vec::<(Weekday, &str)>::new());
    for (day, time) in [(Weekday::Tuesday, "07:45"), (Weekday::Sunday, "10:00")] {
        b.custom_schedule.insert(day, time.to_owned());
    }
    assert_eq!(signature_of(&journal_only(a)), signature_of(&journal_only(b)));
}

#[test]
fn daily_time_half_an_hour_ahead_repeats() {
    let t = memory_engine_at(NOW);
    let report = t.engine.schedule_reminders(&mood_only(ReminderPreference::daily("10:30")));

    assert_eq!(report.scheduled(), 1);
    let live = t.registry.live();
    assert_eq!(live.len(), 1);
    assert_eq!(
        live[0].trigger,
        TriggerSpec::Repeating {
            hour: 10,
            minute: 30,
            weekday: None,
            timezone: "+02:00".to_owned(),
        }
    );
}

#[test]
fn daily_time_an_hour_ago_bootstraps_tomorrow() {
    let t = memory_engine_at(NOW);
    let report = t.engine.schedule_reminders(&mood_only(ReminderPreference::daily("09:00")));

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].kind, TriggerKind::OneShot);
    assert!(report.records[0].is_bootstrap);
    assert_eq!(
        t.registry.live()[0].trigger,
        TriggerSpec::OneShot {
            at: instant("2026-03-05T09:00:00+02:00")
        }
    );
}

#[test]
fn daily_time_two_minutes_ahead_bootstraps_today() {
    let t = memory_engine_at(NOW);
    t.engine.schedule_reminders(&mood_only(ReminderPreference::daily("10:02")));

    let live = t.registry.live();
    assert_eq!(live.len(), 1);
    assert_eq!(
        live[0].trigger,
        TriggerSpec::OneShot {
            at: instant("2026-03-04T10:02:00+02:00")
        }
    );
    assert_eq!(live[0].content.data.get("bootstrap").map(String::as_str), Some("true"));
}

#[test]
fn fire_time_within_seconds_is_nudged() {
    let t = memory_engine_at("2026-03-04T10:01:59+02:00");
    t.engine.schedule_reminders(&mood_only(ReminderPreference::daily("10:02")));

    assert_eq!(
        t.registry.live()[0].trigger,
        TriggerSpec::OneShot {
            at: instant("2026-03-04T10:02:02+02:00")
        }
    );
}

#[test]
fn custom_time_earlier_today_schedules_nothing_for_today() {
    let t = memory_engine_at(NOW);
    let report = t.engine.schedule_reminders(&journal_only(ReminderPreference::custom([(
        Weekday::Wednesday,
        "09:55",
    )])));

    assert_eq!(report.outcome, PassOutcome::FullPass);
    assert!(report.records.is_empty());
    assert!(t.registry.live().is_empty());
}

#[test]
fn custom_keeps_other_days_when_today_is_skipped() {
    let t = memory_engine_at(NOW);
    let report = t.engine.schedule_reminders(&journal_only(ReminderPreference::custom([
        (Weekday::Wednesday, "09:55"),
        (Weekday::Thursday, "09:55"),
    ])));

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].weekday, Some(Weekday::Thursday));
    assert_eq!(report.records[0].kind, TriggerKind::Repeating);
}

#[test]
fn elapsed_one_shots_are_swept_for_any_label() {
    let t = memory_engine_at(NOW);
    t.registry.seed(
        titled("Appointment"),
        TriggerSpec::OneShot {
            at: instant("2026-03-04T09:59:00+02:00"),
        },
    );
    let future = t.registry.seed(
        titled("Appointment"),
        TriggerSpec::OneShot {
            at: instant("2026-03-04T18:00:00+02:00"),
        },
    );

    let report = t.engine.schedule_reminders(&mood_only(ReminderPreference::daily("10:30")));
    assert_eq!(report.swept, 1);
    assert!(t.registry.live().iter().any(|n| n.id == future));
}

#[test]
fn skipped_pass_still_trims_duplicates() {
    let t = memory_engine_at(NOW);
    let settings = journal_only(ReminderPreference::custom([
        (Weekday::Monday, "08:00"),
        (Weekday::Friday, "08:00"),
    ]));
    t.engine.schedule_reminders(&settings);

    let label = ReminderCategory::journal().label;
    for minute in 0..7 {
        t.registry.seed(
            titled(&label),
            TriggerSpec::Repeating {
                hour: 12,
                minute,
                weekday: Some(Weekday::Tuesday),
                timezone: "+02:00".to_owned(),
            },
        );
    }
    assert_eq!(t.registry.live().len(), 9);

    let report = t.engine.schedule_reminders(&settings);
    assert_eq!(report.outcome, PassOutcome::Skipped);
    assert_eq!(report.trimmed, 2);
    assert_eq!(t.registry.live().len(), 7);
}

#[test]
fn delivered_bootstrap_forces_next_pass() {
    let t = memory_engine_at(NOW);
    let settings = mood_only(ReminderPreference::daily("10:03"));
    t.engine.schedule_reminders(&settings);

    // The host drops the one-shot once it has been delivered.
    let delivered = t.registry.live()[0].id.clone();
    cadence::NotificationScheduler::cancel(t.registry.as_ref(), &delivered).unwrap();
    t.clock.set(instant("2026-03-04T10:03:01+02:00"));

    let report = t.engine.schedule_reminders(&settings);
    assert_eq!(report.outcome, PassOutcome::FullPass);
    assert_eq!(
        t.registry.live()[0].trigger,
        TriggerSpec::OneShot {
            at: instant("2026-03-05T10:03:00+02:00")
        }
    );
}

#[test]
fn concurrent_callers_are_serialized() {
    let t = memory_engine_at(NOW);
    let settings = mood_only(ReminderPreference::daily("18:00"));

    std::thread::scope(|scope| {
        for _ in 0..8 {
            let engine = t.engine.clone();
            let settings = settings.clone();
            scope.spawn(move || engine.schedule_reminders(&settings));
        }
    });

    assert_eq!(t.registry.live().len(), 1);
    assert_eq!(t.registry.schedule_calls(), 1);
}

#[test]
fn fire_times_follow_device_zone_across_dst() {
    let registry = Arc::new(InMemoryScheduler::new());
    let clock = Arc::new(FixedClock::in_zone(
        instant("2026-03-28T20:00:00+01:00"),
        chrono_tz::Europe::Berlin,
    ));
    let engine = ReminderEngine::new(registry.clone(), Arc::new(MemoryStore::new()))
        .with_clock(clock.clone());
    let settings = mood_only(ReminderPreference::daily("09:00"));

    engine.schedule_reminders(&settings);
    assert_eq!(
        registry.live()[0].trigger,
        TriggerSpec::OneShot {
            at: instant("2026-03-29T09:00:00+02:00")
        }
    );

    // After the bootstrap fires at 09:00 CEST, the next pass goes repeating
    // and names the zone rather than an offset.
    let delivered = registry.live()[0].id.clone();
    cadence::NotificationScheduler::cancel(registry.as_ref(), &delivered).unwrap();
    clock.set(instant("2026-03-29T07:00:01+00:00"));
    engine.schedule_reminders(&settings);
    assert_eq!(
        registry.live()[0].trigger,
        TriggerSpec::OneShot {
            at: instant("2026-03-30T09:00:00+02:00")
        }
    );

    clock.set(instant("2026-03-29T12:00:00+02:00"));
    let later = engine.schedule_reminders(&mood_only(ReminderPreference::daily("18:00")));
    assert_eq!(later.records[0].kind, TriggerKind::Repeating);
    let expected = TriggerSpec::Repeating {
        hour: 18,
        minute: 0,
        weekday: None,
        timezone: "Europe/Berlin".to_owned(),
    };
    assert!(registry.live().iter().any(|n| n.trigger == expected));
}

#[test]
fn failing_category_does_not_reschedule_others_on_later_passes() {
    let t = memory_engine_at(NOW);
    t.registry.fail_title(Some(ReminderCategory::journal().label));
    let settings = mood_only(ReminderPreference::daily("18:00")).with_category(
        CategorySettings::new(
            ReminderCategory::journal(),
            ReminderPreference::custom([(Weekday::Friday, "08:00")]),
        ),
    );

    let first = t.engine.schedule_reminders(&settings);
    assert_eq!(first.failed_categories, vec!["journal".to_owned()]);
    assert!(first.signature_saved);
    let schedules = t.registry.schedule_calls();
    let cancels = t.registry.cancel_calls();

    for _ in 0..3 {
        let report = t.engine.schedule_reminders(&settings);
        assert_eq!(report.outcome, PassOutcome::Skipped);
    }
    assert_eq!(t.registry.schedule_calls(), schedules);
    assert_eq!(t.registry.cancel_calls(), cancels);
}
