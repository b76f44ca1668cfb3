//! Check-in window calculation.
//!
//! A booking can be checked into from `scheduled_start - grace_period` on.
//! Before that, a countdown is shown once the wait drops under the announce
//! threshold. The state depends on the wall clock, so callers re-evaluate it
//! on a timer rather than only when data changes.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::types::BookingStatus;

/// Default minutes before the scheduled start when check-in opens.
pub const DEFAULT_GRACE_PERIOD_MINUTES: u32 = 15;

/// Default longest wait, in minutes, for which a countdown is shown.
pub const DEFAULT_ANNOUNCE_THRESHOLD_MINUTES: u32 = 60;

/// Check-in availability for one booking at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CheckInState {
    /// Window opens in `countdown_minutes` (rounded up).
    NotYetOpen { countdown_minutes: i64 },
    /// Check-in is available now.
    Open,
    /// Already checked in.
    CheckedIn,
    /// Nothing to show: too far out, or the booking cannot be checked into.
    NotApplicable,
}

impl fmt::Display for CheckInState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotYetOpen { countdown_minutes } => {
                write!(f, "check-in in {countdown_minutes} min")
            }
            Self::Open => write!(f, "check-in open"),
            Self::CheckedIn => write!(f, "checked in"),
            Self::NotApplicable => Ok(()),
        }
    }
}

/// Grace period and announce threshold, in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInWindow {
    pub grace_period_minutes: u32,
    pub announce_threshold_minutes: u32,
}

impl Default for CheckInWindow {
    fn default() -> Self {
        Self {
            grace_period_minutes: DEFAULT_GRACE_PERIOD_MINUTES,
            announce_threshold_minutes: DEFAULT_ANNOUNCE_THRESHOLD_MINUTES,
        }
    }
}

impl CheckInWindow {
    #[must_use]
    pub const fn with_grace_period(mut self, minutes: u32) -> Self {
        self.grace_period_minutes = minutes;
        self
    }

    /// Instant from which check-in is allowed.
    pub fn opens_at(&self, scheduled_start: DateTime<Utc>) -> DateTime<Utc> {
        scheduled_start - Duration::minutes(i64::from(self.grace_period_minutes))
    }

    /// Evaluate the window. First matching rule wins:
    ///
    /// 1. `CHECKED_IN` bookings are [`CheckInState::CheckedIn`].
    /// 2. Statuses without a seat to claim are [`CheckInState::NotApplicable`].
    /// 3. Once the window has opened, [`CheckInState::Open`].
    /// 4. Within the announce threshold, [`CheckInState::NotYetOpen`].
    /// 5. Otherwise [`CheckInState::NotApplicable`].
    pub fn state(
        &self,
        now: DateTime<Utc>,
        scheduled_start: DateTime<Utc>,
        status: BookingStatus,
    ) -> CheckInState {
        if status == BookingStatus::CheckedIn {
            return CheckInState::CheckedIn;
        }
        if !status.allows_check_in() {
            return CheckInState::NotApplicable;
        }

        let opens_at = self.opens_at(scheduled_start);
        if now >= opens_at {
            return CheckInState::Open;
        }

        let countdown_minutes = minutes_until(now, opens_at);
        if countdown_minutes <= i64::from(self.announce_threshold_minutes) {
            CheckInState::NotYetOpen { countdown_minutes }
        } else {
            CheckInState::NotApplicable
        }
    }
}

/// Evaluate check-in with the default announce threshold.
pub fn check_in_state(
    now: DateTime<Utc>,
    scheduled_start: DateTime<Utc>,
    grace_period_minutes: u32,
    status: BookingStatus,
) -> CheckInState {
    CheckInWindow::default()
        .with_grace_period(grace_period_minutes)
        .state(now, scheduled_start, status)
}

/// Whole minutes from `now` until `target`, rounded up.
///
/// 14m30s counts as 15, and any wait under a minute, down to a nanosecond,
/// counts as 1. Returns 0 or less when `target` is not in the future.
pub fn minutes_until(now: DateTime<Utc>, target: DateTime<Utc>) -> i64 {
    let wait = target - now;
    let whole = wait.num_minutes();
    if wait > Duration::minutes(whole) {
        whole + 1
    } else {
        whole
    }
}
