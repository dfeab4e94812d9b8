//! Cleanup of stale and orphaned triggers.

use crate::error::Result;
use crate::notifier::{NotificationScheduler, TriggerSpec};
use chrono::{DateTime, FixedOffset};
use tracing::{debug, warn};

/// Cancel every one-shot trigger whose fire instant is strictly before
/// `now`, whatever category it belongs to.
///
/// Catches one-shots that were registered but never consumed, e.g. when the
/// app was killed before delivery. Returns the number cancelled.
pub fn sweep_stale_one_shots(
    notifier: &dyn NotificationScheduler,
    now: DateTime<FixedOffset>,
) -> Result<usize> {
    let mut cancelled = 0;
    for notification in notifier.list_all()? {
        let TriggerSpec::OneShot { at } = notification.trigger else {
            continue;
        };
        if at >= now {
            continue;
        }
        match notifier.cancel(&notification.id) {
            Ok(()) => {
                debug!(id = %notification.id, %at, "cancelled stale one-shot");
                cancelled += 1;
            }
            Err(e) => warn!(id = %notification.id, "cannot cancel stale one-shot: {e}"),
        }
    }
    Ok(cancelled)
}

/// Cancel every live trigger whose title equals `label`.
///
/// Used after cancelling tracked ids, to catch orphans left by id-tracking
/// drift. Returns the number cancelled.
pub fn purge_label(notifier: &dyn NotificationScheduler, label: &str) -> Result<usize> {
    let mut cancelled = 0;
    for notification in notifier.list_all()? {
        if notification.content.title != label {
            continue;
        }
        match notifier.cancel(&notification.id) {
            Ok(()) => cancelled += 1,
            Err(e) => warn!(id = %notification.id, label, "cannot cancel orphan: {e}"),
        }
    }
    if cancelled > 0 {
        debug!(label, cancelled, "cancelled orphaned triggers");
    }
    Ok(cancelled)
}
