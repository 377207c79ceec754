//! Exponential decay of a single dose.
//!
//! `N(t) = N0 * 0.5^(t / half_life)`

use chrono::{DateTime, Utc};

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Amount of `dose_mg` still in the body after `elapsed_hours`
///
/// Negative elapsed time is clamped to zero, so a dose never grows.
pub fn remaining_dose(dose_mg: f64, elapsed_hours: f64, half_life_hours: f64) -> f64 {
    let elapsed = elapsed_hours.max(0.0);
    dose_mg * 0.5_f64.powf(elapsed / half_life_hours)
}

/// Hours from `from` to `to`, negative if `to` is earlier
pub fn elapsed_hours(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / MILLIS_PER_HOUR
}
