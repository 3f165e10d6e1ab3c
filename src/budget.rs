//! Time budget for a layover excursion
//!
//! Turns the layover window and the fixed exit/return buffers into the
//! usable excursion time, the one-way travel allowance, and the radius used
//! for place discovery.

use chrono::{DateTime, Duration, FixedOffset};
use chrono_tz::Tz;
use serde::Serialize;

/// Smallest search radius in meters
pub const MIN_RADIUS_M: u32 = 3_000;
/// Largest search radius in meters, the places service maximum
pub const MAX_RADIUS_M: u32 = 50_000;
/// Share of the usable window a single one-way trip may consume
const HARD_CAP_SHARE: f64 = 0.45;
/// Floor applied to any feasible allowance
const MIN_ONE_WAY_MINUTES: u32 = 10;

/// One-way allowance keyed on total layover hours; upper bounds are exclusive.
const BUCKETS: [(f64, u32); 6] = [
    (3.0, 10),
    (5.0, 20),
    (7.0, 35),
    (9.0, 55),
    (12.0, 70),
    (14.0, 90),
];
const LONGEST_BUCKET_MINUTES: u32 = 115;

/// Result of the budget calculation for one layover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeBudget {
    pub layover_minutes: u32,
    pub usable_minutes: u32,
    pub one_way_minutes: u32,
    pub radius_m: u32,
}

impl TimeBudget {
    /// A zero allowance means the traveler should not leave the airport
    #[must_use]
    pub fn is_feasible(&self) -> bool {
        self.one_way_minutes > 0
    }
}

/// Budget calculator parameterised by the configured buffers
#[derive(Debug, Clone, Copy)]
pub struct BudgetCalculator {
    pub leave_buffer_minutes: u32,
    pub return_buffer_minutes: u32,
    pub average_speed_kmh: u32,
}

impl Default for BudgetCalculator {
    fn default() -> Self {
        Self {
            leave_buffer_minutes: 45,
            return_buffer_minutes: 90,
            average_speed_kmh: 40,
        }
    }
}

impl BudgetCalculator {
    #[must_use]
    pub fn calculate(&self, layover_minutes: u32) -> TimeBudget {
        let usable_minutes = self.usable_minutes(layover_minutes);
        let one_way_minutes = self.allowed_one_way_minutes(layover_minutes);
        TimeBudget {
            layover_minutes,
            usable_minutes,
            one_way_minutes,
            radius_m: radius_from_one_way(one_way_minutes, self.average_speed_kmh),
        }
    }

    #[must_use]
    pub fn usable_minutes(&self, layover_minutes: u32) -> u32 {
        layover_minutes
            .saturating_sub(self.leave_buffer_minutes)
            .saturating_sub(self.return_buffer_minutes)
    }

    /// One-way allowance: the hour bucket, capped at 45% of the usable window.
    ///
    /// Returns exactly 0 when the cap is not positive.
    #[must_use]
    pub fn allowed_one_way_minutes(&self, layover_minutes: u32) -> u32 {
        let usable = self.usable_minutes(layover_minutes);
        let hard_cap = (f64::from(usable) * HARD_CAP_SHARE).floor() as u32;
        if hard_cap == 0 {
            return 0;
        }
        bucket_minutes(layover_minutes)
            .min(hard_cap)
            .max(MIN_ONE_WAY_MINUTES)
    }

    /// Earliest moment the traveler may leave the airport
    #[must_use]
    pub fn earliest_exit(&self, arrival: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        arrival + Duration::minutes(self.leave_buffer_minutes.into())
    }

    /// Latest moment the traveler must be back at the airport
    #[must_use]
    pub fn latest_return(&self, departure: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        departure - Duration::minutes(self.return_buffer_minutes.into())
    }

    /// Safety buffer description copied verbatim into plan metadata
    #[must_use]
    pub fn safety_buffer_label(&self) -> String {
        format!(
            "exit {}m, return {}m",
            self.leave_buffer_minutes, self.return_buffer_minutes
        )
    }
}

/// Bucketed allowance for a layover, compared in fractional hours with strict `<`.
///
/// A layover of exactly 3.0 hours therefore lands in the 20-minute bucket.
#[must_use]
pub fn bucket_minutes(layover_minutes: u32) -> u32 {
    let hours = f64::from(layover_minutes) / 60.0;
    BUCKETS
        .iter()
        .find(|(upper, _)| hours < *upper)
        .map_or(LONGEST_BUCKET_MINUTES, |(_, minutes)| *minutes)
}

/// Convert a one-way allowance into a search radius in meters
#[must_use]
pub fn radius_from_one_way(one_way_minutes: u32, average_speed_kmh: u32) -> u32 {
    let meters =
        (f64::from(average_speed_kmh) * (f64::from(one_way_minutes) / 60.0) * 1000.0) as u32;
    meters.clamp(MIN_RADIUS_M, MAX_RADIUS_M)
}

/// Format minutes as `Xh Ym`, `Xh 0m`, or `Ym`
#[must_use]
pub fn format_hours_minutes(minutes: u32) -> String {
    let (h, m) = (minutes / 60, minutes % 60);
    if h > 0 {
        format!("{h}h {m}m")
    } else {
        format!("{m}m")
    }
}

/// `HH:MM` label for an instant, rendered in the airport's timezone
#[must_use]
pub fn local_time_label(instant: DateTime<FixedOffset>, timezone: Tz) -> String {
    instant.with_timezone(&timezone).format("%H:%M").to_string()
}
