use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

//
// ─── COUNTDOWN ────────────────────────────────────────────────────────────────
//

/// Observation from one timer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerTick {
    /// Whole seconds remaining, floored at zero.
    pub time_left: u64,
    /// True on exactly one tick: the first observed at or after exhaustion.
    pub expired: bool,
}

/// Drift-resistant countdown anchored to a wall-clock start instant.
///
/// Remaining time is always recomputed as `total − (now − started_at)`
/// rather than decremented per tick, so delayed or throttled ticks cannot
/// make the countdown lag real time. Tick frequency is the caller's
/// affair; it does not change the math.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountdownTimer {
    started_at: DateTime<Utc>,
    total_seconds: u64,
    expiry_reported: bool,
}

impl CountdownTimer {
    /// Arm a countdown of `total_seconds`, anchored at `started_at`.
    #[must_use]
    pub fn start(started_at: DateTime<Utc>, total_seconds: u64) -> Self {
        Self {
            started_at,
            total_seconds,
            expiry_reported: false,
        }
    }

    /// Re-arm a countdown so that `time_left` reads `seconds_left` at
    /// `now`, as when resuming a suspended session.
    #[must_use]
    pub fn resume(now: DateTime<Utc>, total_seconds: u64, seconds_left: u64) -> Self {
        let elapsed = total_seconds.saturating_sub(seconds_left);
        Self {
            started_at: now - Duration::seconds(i64::try_from(elapsed).unwrap_or(i64::MAX)),
            total_seconds,
            expiry_reported: false,
        }
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn total_seconds(&self) -> u64 {
        self.total_seconds
    }

    /// Seconds remaining at `now`, computed from true elapsed wall-clock
    /// time.
    #[must_use]
    pub fn time_left(&self, now: DateTime<Utc>) -> u64 {
        let elapsed = (now - self.started_at).num_seconds().max(0);
        self.total_seconds
            .saturating_sub(u64::try_from(elapsed).unwrap_or(u64::MAX))
    }

    /// Observe the countdown, reporting expiry exactly once.
    ///
    /// The engine only reports; reacting to expiry (by finishing the
    /// session) is the caller's decision.
    pub fn tick(&mut self, now: DateTime<Utc>) -> TimerTick {
        let time_left = self.time_left(now);
        let expired = time_left == 0 && !self.expiry_reported;
        if expired {
            self.expiry_reported = true;
        }
        TimerTick { time_left, expired }
    }
}
