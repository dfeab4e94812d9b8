//! Content signature of the scheduling-relevant settings.
//!
//! A pass is skipped when the signature matches the one persisted by the
//! previous full pass and something is still tracked. Re-registering
//! unchanged triggers near their fire time can make some hosts fire them
//! immediately.

use crate::settings::ReminderSettings;
use crate::store::TriggerStore;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

#[derive(Serialize)]
struct SignatureDoc<'a> {
    notifications_enabled: bool,
    categories: BTreeMap<&'a str, CategoryDoc<'a>>,
}

#[derive(Serialize)]
struct CategoryDoc<'a> {
    notify: bool,
    enabled: bool,
    time: &'a str,
    frequency: &'static str,
    custom_schedule: BTreeMap<&'static str, &'a str>,
}

/// Deterministic signature of `settings`.
///
/// Categories are keyed by id and weekday keys by name, both in sorted
/// maps, so row order and map insertion order do not matter.
#[must_use]
pub fn signature_of(settings: &ReminderSettings) -> String {
    let categories = settings
        .categories
        .iter()
        .map(|entry| {
            let pref = &entry.preference;
            let doc = CategoryDoc {
                notify: entry.notify,
                enabled: pref.enabled,
                time: pref.daily_time.trim(),
                frequency: pref.frequency.as_str(),
                custom_schedule: pref
                    .custom_schedule
                    .iter()
                    .map(|(day, time)| (day.as_str(), time.trim()))
                    .collect(),
            };
            (entry.category.id.as_str(), doc)
        })
        .collect();

    let doc = SignatureDoc {
        notifications_enabled: settings.notifications_enabled,
        categories,
    };

    // Serializing plain structs and string maps cannot fail.
    let canonical = serde_json::to_string(&doc).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Decide between a full pass and a skip.
///
/// Full pass when the signature changed or when nothing is tracked (first
/// run, or a previous pass failed to persist).
#[must_use]
pub fn should_run_full_pass(settings: &ReminderSettings, store: &TriggerStore) -> bool {
    needs_full_pass(&signature_of(settings), store)
}

/// [`should_run_full_pass`] for an already computed signature.
#[must_use]
pub fn needs_full_pass(signature: &str, store: &TriggerStore) -> bool {
    if store.last_signature.as_deref() != Some(signature) {
        return true;
    }
    !store.has_tracked_ids()
}
