//! Scheduling pass orchestration.
//!
//! [`ReminderEngine::schedule_reminders`] is the only entry point hosts call:
//! on app start, after settings are saved, and when a reminder is delivered
//! or tapped. A pass is:
//!
//! 1. sweep stale one-shots
//! 2. stop if notification permission is not granted
//! 3. skip to the dedupe audit if the settings signature is unchanged and
//!    every tracked trigger is still live
//! 4. per category: cancel tracked and orphaned triggers, register new
//!    ones, persist their ids
//! 5. persist the signature
//! 6. dedupe audit
//!
//! Passes are serialized by a global single-flight lock; the read-modify-write
//! over the store and the host registry is not safe to interleave.

use crate::auditor;
use crate::clock::{Clock, DeviceZone, SystemClock};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::notifier::{NotificationScheduler, Permission, TriggerId};
use crate::planner::{self, TriggerRecord};
use crate::settings::{CategorySettings, ReminderCategory, ReminderSettings};
use crate::signature;
use crate::store::{KeyValueStore, TriggerStore};
use crate::sweeper;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

/// How a pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassOutcome {
    /// Aborted after the sweep; the stored signature is untouched.
    PermissionDenied,
    /// Signature unchanged; only the dedupe audit ran.
    Skipped,
    /// Every category was rescheduled.
    FullPass,
}

/// Summary of one pass, for logging and host diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub outcome: PassOutcome,
    /// Stale one-shots cancelled by the sweep.
    pub swept: usize,
    /// Tracked and orphaned triggers cancelled during the full pass.
    pub cancelled: usize,
    /// Triggers registered during the full pass.
    pub records: Vec<TriggerRecord>,
    /// Duplicates cancelled by the audit.
    pub trimmed: usize,
    /// Category ids whose rescheduling failed.
    pub failed_categories: Vec<String>,
    pub signature_saved: bool,
}

impl PassReport {
    fn new(outcome: PassOutcome) -> Self {
        Self {
            outcome,
            swept: 0,
            cancelled: 0,
            records: Vec::new(),
            trimmed: 0,
            failed_categories: Vec::new(),
            signature_saved: false,
        }
    }

    /// Number of triggers registered.
    #[must_use]
    pub fn scheduled(&self) -> usize {
        self.records.len()
    }
}

/// Local reminder scheduling engine.
pub struct ReminderEngine {
    notifier: Arc<dyn NotificationScheduler>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
    /// Single-flight guard around a whole pass.
    pass_lock: Mutex<()>,
}

impl ReminderEngine {
    /// Create an engine on the device clock with default config.
    pub fn new(notifier: Arc<dyn NotificationScheduler>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            notifier,
            store,
            clock: Arc::new(SystemClock),
            config: EngineConfig::default(),
            pass_lock: Mutex::new(()),
        }
    }

    /// Use a custom clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use a custom config.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Active config.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run one scheduling pass for `settings`.
    ///
    /// Never returns an error: adapter failures are logged and reflected in
    /// the report, and the next invocation retries.
    pub fn schedule_reminders(&self, settings: &ReminderSettings) -> PassReport {
        let _guard = self.pass_lock.lock().unwrap_or_else(|p| p.into_inner());
        let now = self.clock.now();
        let zone = self.clock.zone();
        let notifier = self.notifier.as_ref();
        let mut report = PassReport::new(PassOutcome::FullPass);

        report.swept = match sweeper::sweep_stale_one_shots(notifier, now) {
            Ok(swept) => swept,
            Err(e) => {
                warn!("stale one-shot sweep failed: {e}");
                0
            }
        };

        match notifier.permission() {
            Ok(Permission::Granted) => {}
            Ok(Permission::Denied) => {
                info!("notification permission not granted, skipping reminder pass");
                report.outcome = PassOutcome::PermissionDenied;
                return report;
            }
            Err(e) => {
                warn!("cannot query notification permission, skipping reminder pass: {e}");
                report.outcome = PassOutcome::PermissionDenied;
                return report;
            }
        }

        let prefix = self.config.key_prefix.as_str();
        let mut store = TriggerStore::load(
            self.store.as_ref(),
            prefix,
            settings.categories.iter().map(|c| c.category.id.as_str()),
        );
        let drifted = self.reconcile(&mut store);
        let new_signature = signature::signature_of(settings);

        if !drifted && !signature::needs_full_pass(&new_signature, &store) {
            debug!("reminder settings unchanged, skipping full pass");
            report.outcome = PassOutcome::Skipped;
            report.trimmed = self.audit(settings);
            return report;
        }

        for entry in &settings.categories {
            let active = settings.is_active(entry);
            if let Err(e) =
                self.reschedule_category(entry, active, &store, now, &zone, &mut report)
            {
                error!(category = %entry.category.id, "reminder scheduling failed: {e}");
                report.failed_categories.push(entry.category.id.clone());
                self.forget_category(&entry.category.id);
            }
        }

        // Saved even after category failures. A failed category is left with
        // no tracked ids and is rescheduled by the next full pass, which also
        // purges anything left under its label.
        match TriggerStore::save_signature(self.store.as_ref(), prefix, &new_signature) {
            Ok(()) => report.signature_saved = true,
            Err(e) => warn!("cannot persist schedule signature: {e}"),
        }

        report.trimmed = self.audit(settings);

        info!(
            swept = report.swept,
            cancelled = report.cancelled,
            scheduled = report.scheduled(),
            trimmed = report.trimmed,
            "reminder pass complete"
        );
        report
    }

    /// Cancel every reminder of `categories` and forget all bookkeeping.
    ///
    /// For sign-out and similar resets. Returns the number of triggers
    /// cancelled.
    pub fn cancel_all(&self, categories: &[ReminderCategory]) -> Result<usize> {
        let _guard = self.pass_lock.lock().unwrap_or_else(|p| p.into_inner());
        let prefix = self.config.key_prefix.as_str();
        let kv = self.store.as_ref();
        let store = TriggerStore::load(kv, prefix, categories.iter().map(|c| c.id.as_str()));

        let mut cancelled = 0;
        for category in categories {
            cancelled += self.cancel_tracked(store.tracked(&category.id));
            cancelled += sweeper::purge_label(self.notifier.as_ref(), &category.label)?;
            TriggerStore::save_ids(kv, prefix, &category.id, &[])?;
        }
        TriggerStore::save_signature(kv, prefix, "")?;

        info!(cancelled, "cancelled all reminders");
        Ok(cancelled)
    }

    fn reschedule_category(
        &self,
        entry: &CategorySettings,
        active: bool,
        store: &TriggerStore,
        now: DateTime<FixedOffset>,
        zone: &DeviceZone,
        report: &mut PassReport,
    ) -> Result<()> {
        let category = &entry.category;
        let notifier = self.notifier.as_ref();
        let prefix = self.config.key_prefix.as_str();

        report.cancelled += self.cancel_tracked(store.tracked(&category.id));
        report.cancelled += sweeper::purge_label(notifier, &category.label)?;

        if !active {
            debug!(category = %category.id, "reminders disabled for category");
            return TriggerStore::save_ids(self.store.as_ref(), prefix, &category.id, &[]);
        }

        let records = planner::schedule_category(
            notifier,
            category,
            &entry.preference,
            now,
            zone,
            &self.config,
        )?;
        let ids: Vec<TriggerId> = records.iter().map(|r| r.id.clone()).collect();

        // Every registered trigger is tracked; undo the registration when the
        // ids cannot be recorded.
        if let Err(e) = TriggerStore::save_ids(self.store.as_ref(), prefix, &category.id, &ids) {
            let rolled_back = self.cancel_tracked(&ids);
            warn!(category = %category.id, rolled_back, "cannot record trigger ids, rolled back");
            return Err(e);
        }

        debug!(category = %category.id, count = ids.len(), "scheduled category reminders");
        report.records.extend(records);
        Ok(())
    }

    /// Best-effort reset of a failed category's tracked ids.
    fn forget_category(&self, category: &str) {
        let prefix = self.config.key_prefix.as_str();
        if let Err(e) = TriggerStore::save_ids(self.store.as_ref(), prefix, category, &[]) {
            debug!(category, "cannot clear tracked ids of failed category: {e}");
        }
    }

    /// Drop tracked ids that are no longer live. Returns `true` when any
    /// were dropped, e.g. a bootstrap one-shot was delivered or swept.
    fn reconcile(&self, store: &mut TriggerStore) -> bool {
        let live = match self.notifier.list_all() {
            Ok(live) => live,
            Err(e) => {
                warn!("cannot list live triggers for reconciliation: {e}");
                return false;
            }
        };
        let live_ids: HashSet<&TriggerId> = live.iter().map(|n| &n.id).collect();
        let dropped = store.retain_live(&live_ids);
        if dropped > 0 {
            debug!(dropped, "tracked triggers no longer live, forcing full pass");
        }
        dropped > 0
    }

    fn cancel_tracked(&self, ids: &[TriggerId]) -> usize {
        let mut cancelled = 0;
        for id in ids {
            match self.notifier.cancel(id) {
                Ok(()) => cancelled += 1,
                Err(e) => warn!(id = %id, "cannot cancel tracked trigger: {e}"),
            }
        }
        cancelled
    }

    fn audit(&self, settings: &ReminderSettings) -> usize {
        let caps = auditor::caps_for(settings, &self.config);
        match auditor::audit_and_trim(self.notifier.as_ref(), &caps) {
            Ok(trimmed) => trimmed,
            Err(e) => {
                warn!("dedupe audit failed: {e}");
                0
            }
        }
    }
}
