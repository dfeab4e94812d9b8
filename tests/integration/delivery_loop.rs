//! Delivery handler wired to a live engine.

use crate::helpers::{instant, memory_engine_at, mood_only};
use cadence::settings::StaticSettings;
use cadence::{DeliveryEvent, DeliveryHandler, DeliveryKind, ReminderPreference, TriggerSpec};
use std::sync::Arc;

#[tokio::test]
async fn delivered_bootstrap_is_rescheduled_by_listener() {
    let t = memory_engine_at("2026-03-04T10:00:00+00:00");
    let settings = mood_only(ReminderPreference::daily("10:01"));
    t.engine.schedule_reminders(&settings);

    let bootstrap = t.registry.live()[0].clone();
    assert!(bootstrap.trigger.is_one_shot());

    // Fired: the host removes it and forwards the payload.
    cadence::NotificationScheduler::cancel(t.registry.as_ref(), &bootstrap.id).unwrap();
    t.clock.set(instant("2026-03-04T10:01:00+00:00"));

    let handler = DeliveryHandler::new(t.engine.clone(), Arc::new(StaticSettings(settings)));
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let listener = handler.spawn(rx);
    tx.send(DeliveryEvent::new(DeliveryKind::Received, bootstrap.content.data.clone()))
        .unwrap();
    drop(tx);
    listener.await.unwrap();

    // 10:01 is now exactly "now": still near, so a fresh nudged bootstrap.
    let live = t.registry.live();
    assert_eq!(live.len(), 1);
    assert_eq!(
        live[0].trigger,
        TriggerSpec::OneShot {
            at: instant("2026-03-04T10:01:02+00:00")
        }
    );
}
