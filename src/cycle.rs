// 📅 Cycle Keys - Monthly accounting periods
//
// A cycle key is the `YYYY-MM` label stamped on every mandatory expense so
// recurring costs can be grouped month over month.
//
// Time is explicit here: "now" comes from an injected Clock, and the calendar
// used to read year/month comes from an explicit CycleZone.

use chrono::{DateTime, Datelike, FixedOffset, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock};
use thiserror::Error;

// ============================================================================
// CYCLE KEY
// ============================================================================

/// Identifier of one calendar-month accounting period, rendered as `YYYY-MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct CycleKey {
    year: i32,
    month: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CycleKeyError {
    #[error("cycle key must look like YYYY-MM, got {0:?}")]
    Malformed(String),

    #[error("cycle key month must be between 01 and 12, got {0}")]
    MonthOutOfRange(u32),
}

impl CycleKey {
    /// Key for a year and a 1-indexed month
    pub fn new(year: i32, month: u32) -> Result<Self, CycleKeyError> {
        if !(1..=12).contains(&month) {
            return Err(CycleKeyError::MonthOutOfRange(month));
        }
        Ok(CycleKey { year, month })
    }

    pub fn from_naive_date(date: NaiveDate) -> Self {
        cycle_key_from_date(&date)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Month, 1-indexed
    pub fn month(&self) -> u32 {
        self.month
    }

    /// The period that follows this one
    pub fn next(&self) -> CycleKey {
        if self.month == 12 {
            CycleKey { year: self.year + 1, month: 1 }
        } else {
            CycleKey { year: self.year, month: self.month + 1 }
        }
    }

    /// The period that precedes this one
    pub fn previous(&self) -> CycleKey {
        if self.month == 1 {
            CycleKey { year: self.year - 1, month: 12 }
        } else {
            CycleKey { year: self.year, month: self.month - 1 }
        }
    }
}

impl fmt::Display for CycleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for CycleKey {
    type Err = CycleKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || CycleKeyError::Malformed(s.to_string());

        let bytes = s.as_bytes();
        if bytes.len() != 7 || bytes[4] != b'-' {
            return Err(malformed());
        }
        let (year, month) = (&s[..4], &s[5..]);
        if !year.bytes().chain(month.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }

        let year: i32 = year.parse().map_err(|_| malformed())?;
        let month: u32 = month.parse().map_err(|_| malformed())?;
        CycleKey::new(year, month)
    }
}

impl TryFrom<&str> for CycleKey {
    type Error = CycleKeyError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<String> for CycleKey {
    type Error = CycleKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CycleKey> for String {
    fn from(key: CycleKey) -> Self {
        key.to_string()
    }
}

/// Cycle key of any calendar value, read from its own year and month
///
/// Day and time of day are ignored, so every value inside one calendar month
/// maps to the same key. For zoned timestamps the calendar is the zone the
/// value carries; use [`CycleKeyDeriver::key_at`] to pick a zone explicitly.
pub fn cycle_key_from_date<D: Datelike>(date: &D) -> CycleKey {
    CycleKey {
        year: date.year(),
        month: date.month(),
    }
}

// ============================================================================
// CLOCKS
// ============================================================================

/// Source of the current instant
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        ManualClock { now: RwLock::new(now) }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.write().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut guard = self.now.write().unwrap_or_else(|e| e.into_inner());
        *guard += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().unwrap_or_else(|e| e.into_inner())
    }
}

// ============================================================================
// CYCLE ZONE
// ============================================================================

/// Calendar used to decide which month an instant belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CycleZone {
    /// The host's local time zone
    #[default]
    Local,
    Utc,
    /// A fixed offset from UTC, e.g. a user-profile setting
    Fixed(FixedOffset),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown cycle zone {0:?}: expected \"local\", \"utc\" or an offset like \"+05:30\"")]
pub struct CycleZoneError(String);

impl FromStr for CycleZone {
    type Err = CycleZoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "local" => return Ok(CycleZone::Local),
            "utc" | "z" => return Ok(CycleZone::Utc),
            _ => {}
        }
        trimmed
            .parse::<FixedOffset>()
            .map(CycleZone::Fixed)
            .map_err(|_| CycleZoneError(s.to_string()))
    }
}

impl fmt::Display for CycleZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleZone::Local => write!(f, "local"),
            CycleZone::Utc => write!(f, "utc"),
            CycleZone::Fixed(offset) => write!(f, "{}", offset),
        }
    }
}

// ============================================================================
// DERIVER
// ============================================================================

/// Answers "which period is it now?" against an injected clock and zone
///
/// Stateless apart from its collaborators: nothing is cached, every call
/// reads the clock again.
#[derive(Clone)]
pub struct CycleKeyDeriver {
    clock: Arc<dyn Clock>,
    zone: CycleZone,
}

impl CycleKeyDeriver {
    pub fn new(clock: Arc<dyn Clock>, zone: CycleZone) -> Self {
        CycleKeyDeriver { clock, zone }
    }

    /// Wall clock, host-local calendar
    pub fn system() -> Self {
        Self::new(Arc::new(SystemClock), CycleZone::Local)
    }

    pub fn zone(&self) -> CycleZone {
        self.zone
    }

    /// Key of the month containing `instant` in this deriver's zone
    pub fn key_at(&self, instant: DateTime<Utc>) -> CycleKey {
        match self.zone {
            CycleZone::Local => cycle_key_from_date(&instant.with_timezone(&Local)),
            CycleZone::Utc => cycle_key_from_date(&instant),
            CycleZone::Fixed(offset) => cycle_key_from_date(&instant.with_timezone(&offset)),
        }
    }

    pub fn current_cycle_key(&self) -> CycleKey {
        self.key_at(self.clock.now())
    }

    /// True iff `key` is exactly the text of the current key
    ///
    /// Absent or empty input is never current. No parsing happens, so
    /// `"2024-3"` never matches `"2024-03"`.
    pub fn is_cycle_key_current(&self, key: Option<&str>) -> bool {
        match key {
            None | Some("") => false,
            Some(key) => key == self.current_cycle_key().to_string(),
        }
    }
}

impl Default for CycleKeyDeriver {
    fn default() -> Self {
        Self::system()
    }
}

impl fmt::Debug for CycleKeyDeriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CycleKeyDeriver")
            .field("zone", &self.zone)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// TESTS
// ============================================================================
