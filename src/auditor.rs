//! Per-label trigger caps.
//!
//! Runs after every pass, including skipped ones, and trims triggers that
//! accumulated from races or from older builds that tracked ids differently.

use crate::config::EngineConfig;
use crate::error::Result;
use crate::notifier::{NotificationScheduler, ScheduledNotification};
use crate::settings::{FrequencyMode, ReminderSettings};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Maximum live triggers per category label.
///
/// Custom (weekly) categories get `custom_cap`, daily ones `daily_cap`.
#[must_use]
pub fn caps_for(settings: &ReminderSettings, config: &EngineConfig) -> BTreeMap<String, usize> {
    settings
        .categories
        .iter()
        .map(|entry| {
            let cap = match entry.preference.frequency {
                FrequencyMode::Custom => config.custom_cap,
                FrequencyMode::Daily => config.daily_cap,
            };
            (entry.category.label.clone(), cap)
        })
        .collect()
}

/// Cancel triggers over each label's cap. Returns the number cancelled.
///
/// One-shots go first, then the most recently listed repeating triggers.
/// Labels missing from `caps` are left alone.
pub fn audit_and_trim(
    notifier: &dyn NotificationScheduler,
    caps: &BTreeMap<String, usize>,
) -> Result<usize> {
    let mut groups: BTreeMap<&str, Vec<ScheduledNotification>> = BTreeMap::new();
    let live = notifier.list_all()?;
    for notification in &live {
        if caps.contains_key(&notification.content.title) {
            groups
                .entry(notification.content.title.as_str())
                .or_default()
                .push(notification.clone());
        }
    }

    let mut cancelled = 0;
    for (label, group) in groups {
        let cap = caps.get(label).copied().unwrap_or(usize::MAX);
        if group.len() <= cap {
            continue;
        }
        let excess = group.len() - cap;
        warn!(label, live = group.len(), cap, "trimming duplicate reminder triggers");

        for victim in excess_order(group).into_iter().take(excess) {
            match notifier.cancel(&victim.id) {
                Ok(()) => cancelled += 1,
                Err(e) => warn!(id = %victim.id, label, "cannot cancel duplicate: {e}"),
            }
        }
    }

    if cancelled > 0 {
        info!(cancelled, "dedupe audit trimmed triggers");
    }
    Ok(cancelled)
}

/// Group members ordered by cancellation preference.
fn excess_order(group: Vec<ScheduledNotification>) -> Vec<ScheduledNotification> {
    let (mut one_shots, mut repeating): (Vec<_>, Vec<_>) =
        group.into_iter().partition(|n| n.trigger.is_one_shot());
    one_shots.reverse();
    repeating.reverse();
    one_shots.extend(repeating);
    one_shots
}
