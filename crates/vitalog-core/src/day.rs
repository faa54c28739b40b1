//! Calendar-day normalization.
//!
//! Every check-in timestamp is truncated to a calendar day in one fixed
//! reference frame before streak computation. The frame is a single UTC
//! offset applied uniformly to all users and all timestamps -- not a
//! per-user timezone.

use std::collections::BTreeSet;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

use crate::error::ConfigError;

/// The day-boundary convention used to turn timestamps into calendar days.
///
/// Wraps a fixed UTC offset. All users share the same boundary; a user whose
/// local midnight falls on the other side of it can be marked as missing a
/// day they kept locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayBoundary {
    offset: FixedOffset,
}

impl DayBoundary {
    /// Boundary at UTC midnight.
    pub fn utc() -> Self {
        // Offset zero is always valid.
        Self {
            offset: FixedOffset::east_opt(0).unwrap(),
        }
    }

    /// Boundary shifted by a whole number of hours from UTC.
    ///
    /// # Errors
    /// Returns an error when the offset is outside the valid range
    /// (-23..=23 hours).
    pub fn from_offset_hours(hours: i32) -> Result<Self, ConfigError> {
        let offset =
            FixedOffset::east_opt(hours * 3600).ok_or_else(|| ConfigError::InvalidValue {
                key: "day_offset_hours".to_string(),
                message: format!("offset of {hours} hours is out of range"),
            })?;
        Ok(Self { offset })
    }

    /// Truncate a timestamp to its calendar day in this reference frame.
    pub fn day_key(&self, occurred_at: DateTime<Utc>) -> NaiveDate {
        occurred_at.with_timezone(&self.offset).date_naive()
    }

    /// Collapse a batch of timestamps into the set of calendar days they
    /// fall on. Multiple check-ins on the same day produce one key.
    pub fn day_keys<I>(&self, timestamps: I) -> BTreeSet<NaiveDate>
    where
        I: IntoIterator<Item = DateTime<Utc>>,
    {
        timestamps.into_iter().map(|ts| self.day_key(ts)).collect()
    }

    /// The calendar day a given instant falls on -- used by callers to
    /// derive the run's reference day from the wall clock.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        self.day_key(now)
    }
}

impl Default for DayBoundary {
    fn default() -> Self {
        Self::utc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_day_key_truncates_time() {
        let boundary = DayBoundary::utc();
        let key = boundary.day_key(ts(2026, 3, 14, 23, 59));
        assert_eq!(key, NaiveDate::from_ymd_opt(2026, 3, 14).unwrap());
    }

    #[test]
    fn test_offset_shifts_boundary() {
        // 23:00 UTC is already the next day at UTC+2.
        let boundary = DayBoundary::from_offset_hours(2).unwrap();
        let key = boundary.day_key(ts(2026, 3, 14, 23, 0));
        assert_eq!(key, NaiveDate::from_ymd_opt(2026, 3, 15).unwrap());

        // And 00:30 UTC is still the previous day at UTC-2.
        let boundary = DayBoundary::from_offset_hours(-2).unwrap();
        let key = boundary.day_key(ts(2026, 3, 15, 0, 30));
        assert_eq!(key, NaiveDate::from_ymd_opt(2026, 3, 14).unwrap());
    }

    #[test]
    fn test_day_keys_collapse_duplicates() {
        let boundary = DayBoundary::utc();
        let keys = boundary.day_keys(vec![
            ts(2026, 3, 14, 8, 0),
            ts(2026, 3, 14, 12, 30),
            ts(2026, 3, 14, 21, 45),
            ts(2026, 3, 15, 9, 0),
        ]);
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()));
        assert!(keys.contains(&NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()));
    }

    #[test]
    fn test_invalid_offset_rejected() {
        assert!(DayBoundary::from_offset_hours(24).is_err());
        assert!(DayBoundary::from_offset_hours(-24).is_err());
    }

    #[test]
    fn test_today_matches_day_key() {
        let boundary = DayBoundary::from_offset_hours(9).unwrap();
        let now = ts(2026, 3, 14, 20, 0);
        assert_eq!(boundary.today(now), boundary.day_key(now));
    }
}
