//! Reminder preference model.
//!
//! [`ReminderSettings`] is the immutable input of one scheduling pass. It is
//! supplied by the host's settings layer; cadence only reads it.

use crate::error::{CadenceError, Result};
use crate::time::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named reminder domain with a fixed notification label.
///
/// The label doubles as the notification title and as the key used to find
/// orphaned triggers, so it must stay stable across releases.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReminderCategory {
    /// Stable identifier (e.g. `"mood"`).
    pub id: String,
    /// Human-readable label.
    pub label: String,
    /// Notification body text.
    #[serde(default)]
    pub body: String,
}

impl ReminderCategory {
    pub fn new(id: impl Into<String>, label: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            body: body.into(),
        }
    }

    /// Built-in mood tracking category.
    #[must_use]
    pub fn mood() -> Self {
        Self::new("mood", "Mood Check-in", "How are you feeling right now?")
    }

    /// Built-in journaling category.
    #[must_use]
    pub fn journal() -> Self {
        Self::new("journal", "Journal Reminder", "Take a moment to write in your journal.")
    }
}

/// Recurrence mode of a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyMode {
    /// Once a day at `daily_time`.
    #[default]
    Daily,
    /// Per-weekday times from `custom_schedule`.
    Custom,
}

impl FrequencyMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Custom => "custom",
        }
    }
}

/// Scheduling preference of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderPreference {
    pub enabled: bool,
    pub frequency: FrequencyMode,
    /// `"HH:mm"`, used in [`FrequencyMode::Daily`].
    pub daily_time: String,
    /// Sparse weekday → `"HH:mm"` map, used in [`FrequencyMode::Custom`].
    pub custom_schedule: BTreeMap<Weekday, String>,
}

impl Default for ReminderPreference {
    fn default() -> Self {
        Self {
            enabled: false,
            frequency: FrequencyMode::Daily,
            daily_time: "09:00".to_owned(),
            custom_schedule: BTreeMap::new(),
        }
    }
}

impl ReminderPreference {
    /// Enabled daily preference at `time`.
    pub fn daily(time: impl Into<String>) -> Self {
        Self {
            enabled: true,
            frequency: FrequencyMode::Daily,
            daily_time: time.into(),
            custom_schedule: BTreeMap::new(),
        }
    }

    /// Enabled custom preference from `(weekday, time)` pairs.
    pub fn custom<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Weekday, S)>,
        S: Into<String>,
    {
        Self {
            enabled: true,
            frequency: FrequencyMode::Custom,
            daily_time: "09:00".to_owned(),
            custom_schedule: entries.into_iter().map(|(d, t)| (d, t.into())).collect(),
        }
    }

    /// Custom-schedule entries that carry a non-empty time.
    pub fn scheduled_days(&self) -> impl Iterator<Item = (Weekday, &str)> {
        self.custom_schedule
            .iter()
            .filter(|(_, time)| !time.trim().is_empty())
            .map(|(day, time)| (*day, time.as_str()))
    }
}

/// One row of the category table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySettings {
    pub category: ReminderCategory,
    /// Category-level "notify me about this" switch.
    #[serde(default = "default_notify")]
    pub notify: bool,
    #[serde(default)]
    pub preference: ReminderPreference,
}

fn default_notify() -> bool {
    true
}

impl CategorySettings {
    pub fn new(category: ReminderCategory, preference: ReminderPreference) -> Self {
        Self {
            category,
            notify: true,
            preference,
        }
    }
}

/// Full preference set for one scheduling pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSettings {
    /// Global notification switch.
    #[serde(default = "default_notify")]
    pub notifications_enabled: bool,
    #[serde(default)]
    pub categories: Vec<CategorySettings>,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            notifications_enabled: true,
            categories: Vec::new(),
        }
    }
}

impl ReminderSettings {
    /// Add or replace the row for `entry.category.id`.
    #[must_use]
    pub fn with_category(mut self, entry: CategorySettings) -> Self {
        if let Some(existing) = self
            .categories
            .iter_mut()
            .find(|c| c.category.id == entry.category.id)
        {
            *existing = entry;
        } else {
            self.categories.push(entry);
        }
        self
    }

    /// Returns `true` when triggers may exist for this row: the global
    /// switch, the category switch and the preference all have to be on.
    #[must_use]
    pub fn is_active(&self, entry: &CategorySettings) -> bool {
        self.notifications_enabled && entry.notify && entry.preference.enabled
    }

    /// Load settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CadenceError::Settings(e.to_string()))
    }
}

/// Supplies current settings when the engine is re-invoked from outside a
/// settings screen (delivery, tap, app start).
pub trait SettingsProvider: Send + Sync {
    /// Load the latest settings.
    fn load_settings(&self) -> Result<ReminderSettings>;
}

/// Provider that always returns the same settings value.
#[derive(Debug, Clone)]
pub struct StaticSettings(pub ReminderSettings);

impl SettingsProvider for StaticSettings {
    fn load_settings(&self) -> Result<ReminderSettings> {
        Ok(self.0.clone())
    }
}
