//! Injectable wall clock and the device timezone.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone};
use chrono_tz::Tz;
use std::sync::Mutex;
use tracing::debug;

/// Timezone used to turn wall-clock reminder times into instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceZone {
    /// IANA zone, DST rules included.
    Named(Tz),
    /// Bare UTC offset, when the device zone name is unknown.
    Fixed(FixedOffset),
}

impl DeviceZone {
    /// Label attached to repeating triggers: the IANA name, or the offset
    /// (`+02:00`) for fixed zones.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Named(tz) => tz.name().to_owned(),
            Self::Fixed(offset) => offset.to_string(),
        }
    }

    /// `instant` expressed with this zone's offset at that instant.
    #[must_use]
    pub fn localize(&self, instant: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        match self {
            Self::Named(tz) => instant.with_timezone(tz).fixed_offset(),
            Self::Fixed(offset) => instant.with_timezone(offset),
        }
    }

    /// Instant of wall-clock `time` on `date` in this zone.
    ///
    /// A time repeated by a backward shift resolves to its first
    /// occurrence. A time skipped by a forward shift resolves to the same
    /// wall time one hour later.
    #[must_use]
    pub fn resolve(&self, date: NaiveDate, time: NaiveTime) -> DateTime<FixedOffset> {
        let naive = date.and_time(time);
        match self {
            Self::Named(tz) => resolve_in(tz, naive),
            Self::Fixed(offset) => resolve_in(offset, naive),
        }
    }
}

fn resolve_in<Z: TimeZone>(zone: &Z, naive: NaiveDateTime) -> DateTime<FixedOffset> {
    zone.from_local_datetime(&naive)
        .earliest()
        .or_else(|| {
            zone.from_local_datetime(&(naive + TimeDelta::hours(1)))
                .earliest()
        })
        .map(|dt| dt.fixed_offset())
        .unwrap_or_else(|| naive.and_utc().fixed_offset())
}

/// Source of "now" and of the device's current timezone.
pub trait Clock: Send + Sync {
    /// Current local time with its UTC offset.
    fn now(&self) -> DateTime<FixedOffset>;

    /// Current device timezone.
    fn zone(&self) -> DeviceZone;
}

/// Device clock backed by `chrono::Local`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        chrono::Local::now().fixed_offset()
    }

    fn zone(&self) -> DeviceZone {
        let fixed = || DeviceZone::Fixed(*self.now().offset());
        match iana_time_zone::get_timezone() {
            Ok(name) => match name.parse::<Tz>() {
                Ok(tz) => DeviceZone::Named(tz),
                Err(e) => {
                    debug!(zone = %name, "unknown device timezone, using current offset: {e}");
                    fixed()
                }
            },
            Err(e) => {
                debug!("cannot read device timezone, using current offset: {e}");
                fixed()
            }
        }
    }
}

/// Settable clock for tests and dry runs.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<FixedOffset>>,
    tz: Option<Tz>,
}

impl FixedClock {
    /// Create a clock frozen at `now`, in the fixed zone of its offset.
    #[must_use]
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self {
            now: Mutex::new(now),
            tz: None,
        }
    }

    /// Create a clock frozen at `now` in the named zone `tz`.
    #[must_use]
    pub fn in_zone(now: DateTime<FixedOffset>, tz: Tz) -> Self {
        Self {
            now: Mutex::new(now),
            tz: Some(tz),
        }
    }

    /// Move the clock to `now`.
    pub fn set(&self, now: DateTime<FixedOffset>) {
        *self.now.lock().unwrap_or_else(|p| p.into_inner()) = now;
    }

    /// Move the clock forward by `delta`.
    pub fn advance(&self, delta: TimeDelta) {
        let mut guard = self.now.lock().unwrap_or_else(|p| p.into_inner());
        *guard += delta;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        let now = *self.now.lock().unwrap_or_else(|p| p.into_inner());
        match self.tz {
            Some(tz) => DeviceZone::Named(tz).localize(now),
            None => now,
        }
    }

    fn zone(&self) -> DeviceZone {
        match self.tz {
            Some(tz) => DeviceZone::Named(tz),
            None => DeviceZone::Fixed(*self.now().offset()),
        }
    }
}
