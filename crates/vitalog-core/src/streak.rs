//! Daily streak computation.
//!
//! A streak is the number of consecutive calendar days, ending at and
//! including the run's reference day, on which the user has at least one
//! check-in. The count is always rebuilt from the full day-key set -- no
//! stored value is trusted across runs, so a rerun for the same day is a
//! no-op and a missed run heals itself the next day.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Per-user streak record, overwritten on every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    /// Number of consecutive qualifying days ending today.
    pub streak_count: u32,

    /// The day anchoring the streak (today, when the streak is alive), or
    /// the most recent check-in day when the streak is broken. `None` only
    /// for users with no history at all.
    pub last_confirmed_date: Option<NaiveDate>,
}

impl StreakState {
    /// The record written for a user with no check-in history.
    pub fn empty() -> Self {
        Self {
            streak_count: 0,
            last_confirmed_date: None,
        }
    }
}

/// Compute the streak for one user.
///
/// Strict same-day policy: `today` must itself be in the set for the streak
/// to be alive. When it is, the count walks backward one day at a time and
/// stops at the first gap; when it is not, the streak is 0 and
/// `last_confirmed_date` retains the most recent check-in day as a
/// last-seen marker.
///
/// `today` is injected by the caller rather than read from a clock, so the
/// same inputs always produce the same output.
pub fn compute_streak(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> StreakState {
    if !days.contains(&today) {
        return StreakState {
            streak_count: 0,
            last_confirmed_date: days.last().copied(),
        };
    }

    let mut streak_count = 1u32;
    let mut cursor = today;
    // Bounded by the first gap, not by history size.
    while let Some(prev) = cursor.pred_opt() {
        if !days.contains(&prev) {
            break;
        }
        streak_count += 1;
        cursor = prev;
    }

    StreakState {
        streak_count,
        last_confirmed_date: Some(today),
    }
}
