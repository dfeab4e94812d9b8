//! Per-category trigger planning.
//!
//! Each target fire time is classified against "now" into one of three
//! windows and turned into a trigger:
//!
//! | Window | Daily | Custom, today | Custom, other day |
//! |--------|-------|---------------|-------------------|
//! | past   | one-shot tomorrow | nothing | weekly repeating |
//! | near   | one-shot today | one-shot today | weekly repeating |
//! | future | daily repeating | weekly repeating | weekly repeating |
//!
//! One-shots are bootstraps. A repeating trigger whose first occurrence is
//! only minutes away can fire on registration on some hosts, so the engine
//! registers a one-shot instead and relies on the delivery handler to run
//! the next pass, which then registers the repeating trigger.

use crate::clock::DeviceZone;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::notifier::{
    NotificationContent, NotificationScheduler, PAYLOAD_BOOTSTRAP_KEY, PAYLOAD_CATEGORY_KEY,
    PAYLOAD_TYPE_KEY, PAYLOAD_TYPE_REMINDER, TriggerId, TriggerSpec,
};
use crate::settings::{FrequencyMode, ReminderCategory, ReminderPreference};
use crate::time::{TimeOfDay, Weekday};
use chrono::{DateTime, Days, FixedOffset, NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Position of a target fire time relative to "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    /// Already passed today.
    Past,
    /// Within the near window (inclusive).
    Near,
    /// Further out than the near window.
    Future,
}

/// Classify `delta = fire_time - now`.
#[must_use]
pub fn classify(delta: TimeDelta, near_window: TimeDelta) -> TimeWindow {
    if delta < TimeDelta::zero() {
        TimeWindow::Past
    } else if delta <= near_window {
        TimeWindow::Near
    } else {
        TimeWindow::Future
    }
}

/// Trigger recurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    OneShot,
    Repeating,
}

/// A trigger the planner wants registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedTrigger {
    pub kind: TriggerKind,
    pub fire_at: TimeOfDay,
    pub weekday: Option<Weekday>,
    pub is_bootstrap: bool,
    pub spec: TriggerSpec,
}

/// A registered trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerRecord {
    pub id: TriggerId,
    /// Category id.
    pub category: String,
    pub kind: TriggerKind,
    pub fire_at: TimeOfDay,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekday: Option<Weekday>,
    pub is_bootstrap: bool,
}

/// Compute the triggers for one active category. Pure.
///
/// Wall-clock times are resolved in `zone`, so "tomorrow at 09:00" stays
/// 09:00 across a DST change.
#[must_use]
pub fn plan_category(
    preference: &ReminderPreference,
    now: DateTime<FixedOffset>,
    zone: &DeviceZone,
    config: &EngineConfig,
) -> Vec<PlannedTrigger> {
    let planner = Planner::new(now, *zone, config);
    match preference.frequency {
        FrequencyMode::Daily => {
            let time = TimeOfDay::parse_or(&preference.daily_time, config.fallback_time());
            vec![planner.daily(time)]
        }
        FrequencyMode::Custom => preference
            .scheduled_days()
            .filter_map(|(day, text)| {
                let time = TimeOfDay::parse_or(text, config.fallback_time());
                planner.weekly(day, time)
            })
            .collect(),
    }
}

/// Plan and register triggers for one active category.
///
/// On a registration failure the triggers already registered by this call
/// are cancelled again before the error is returned, so a failed category
/// leaves nothing untracked behind.
pub fn schedule_category(
    notifier: &dyn NotificationScheduler,
    category: &ReminderCategory,
    preference: &ReminderPreference,
    now: DateTime<FixedOffset>,
    zone: &DeviceZone,
    config: &EngineConfig,
) -> Result<Vec<TriggerRecord>> {
    let plan = plan_category(preference, now, zone, config);
    let mut records = Vec::with_capacity(plan.len());

    for planned in plan {
        let content = content_for(category, planned.is_bootstrap);
        match notifier.schedule(content, planned.spec) {
            Ok(id) => {
                debug!(
                    category = %category.id,
                    id = %id,
                    kind = ?planned.kind,
                    at = %planned.fire_at,
                    "registered reminder trigger"
                );
                records.push(TriggerRecord {
                    id,
                    category: category.id.clone(),
                    kind: planned.kind,
                    fire_at: planned.fire_at,
                    weekday: planned.weekday,
                    is_bootstrap: planned.is_bootstrap,
                });
            }
            Err(e) => {
                for record in &records {
                    if let Err(cancel_err) = notifier.cancel(&record.id) {
                        warn!(id = %record.id, "rollback cancel failed: {cancel_err}");
                    }
                }
                return Err(e);
            }
        }
    }

    Ok(records)
}

/// Notification content for a reminder of `category`.
#[must_use]
pub fn content_for(category: &ReminderCategory, is_bootstrap: bool) -> NotificationContent {
    let mut data = BTreeMap::new();
    data.insert(PAYLOAD_TYPE_KEY.to_owned(), PAYLOAD_TYPE_REMINDER.to_owned());
    data.insert(PAYLOAD_CATEGORY_KEY.to_owned(), category.id.clone());
    data.insert(PAYLOAD_BOOTSTRAP_KEY.to_owned(), is_bootstrap.to_string());
    NotificationContent {
        title: category.label.clone(),
        body: category.body.clone(),
        data,
    }
}

struct Planner<'a> {
    /// "Now" on the device's wall clock.
    now: DateTime<FixedOffset>,
    zone: DeviceZone,
    config: &'a EngineConfig,
}

impl<'a> Planner<'a> {
    fn new(now: DateTime<FixedOffset>, zone: DeviceZone, config: &'a EngineConfig) -> Self {
        Self {
            now: zone.localize(now),
            zone,
            config,
        }
    }

    fn near_window(&self) -> TimeDelta {
        TimeDelta::seconds(i64::from(self.config.near_window_secs))
    }

    fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    fn instant_on(&self, date: NaiveDate, time: TimeOfDay) -> DateTime<FixedOffset> {
        self.zone.resolve(date, time.to_naive())
    }

    fn daily(&self, time: TimeOfDay) -> PlannedTrigger {
        let today_fire = self.instant_on(self.today(), time);
        match classify(today_fire - self.now, self.near_window()) {
            TimeWindow::Past => {
                let tomorrow = self
                    .today()
                    .checked_add_days(Days::new(1))
                    .unwrap_or(self.today());
                self.one_shot(self.instant_on(tomorrow, time), time)
            }
            TimeWindow::Near => self.one_shot(self.nudged(today_fire), time),
            TimeWindow::Future => self.repeating(time, None),
        }
    }

    fn weekly(&self, day: Weekday, time: TimeOfDay) -> Option<PlannedTrigger> {
        if day == Weekday::from(chrono::Datelike::weekday(&self.now)) {
            let today_fire = self.instant_on(self.today(), time);
            match classify(today_fire - self.now, self.near_window()) {
                TimeWindow::Past => {
                    debug!(%day, at = %time, "today's custom time already passed, skipping");
                    return None;
                }
                TimeWindow::Near => return Some(self.one_shot(self.nudged(today_fire), time)),
                TimeWindow::Future => {}
            }
        }
        Some(self.repeating(time, Some(day)))
    }

    /// Push a fire instant that is too close to "now" slightly forward.
    fn nudged(&self, fire: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        let threshold = TimeDelta::seconds(i64::from(self.config.nudge_threshold_secs));
        if fire - self.now < threshold {
            fire + TimeDelta::seconds(i64::from(self.config.nudge_secs))
        } else {
            fire
        }
    }

    fn one_shot(&self, at: DateTime<FixedOffset>, time: TimeOfDay) -> PlannedTrigger {
        PlannedTrigger {
            kind: TriggerKind::OneShot,
            fire_at: time,
            weekday: None,
            is_bootstrap: true,
            spec: TriggerSpec::OneShot { at },
        }
    }

    fn repeating(&self, time: TimeOfDay, weekday: Option<Weekday>) -> PlannedTrigger {
        PlannedTrigger {
            kind: TriggerKind::Repeating,
            fire_at: time,
            weekday,
            is_bootstrap: false,
            spec: TriggerSpec::Repeating {
                hour: time.hour,
                minute: time.minute,
                weekday,
                timezone: self.zone.name(),
            },
        }
    }
}
