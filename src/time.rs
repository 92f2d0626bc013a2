//! Time Quantizer.
//!
//! Converts between absolute UTC instants and integer minutes relative
//! to a horizon start. Every downstream stage (Model Builder, Search
//! Engine, Validator) operates exclusively in minute units — this is
//! the only module that touches [`chrono::DateTime`] arithmetic.
//!
//! # Round-trip law
//! For any minute-aligned instant `t` within the horizon,
//! `to_instant(horizon_start, to_minutes(horizon_start, t)?) == t`.

use chrono::{DateTime, Duration, Utc};

use crate::error::ScheduleError;
use crate::model::Horizon;

/// Converts an absolute instant to integer minutes since `horizon_start`.
///
/// `instant` must be minute-aligned (zero seconds and nanoseconds);
/// anything else is rejected as an `invalid_request` error rather than
/// silently truncated, per the quantizer's exactness guarantee.
pub fn to_minutes(horizon_start: DateTime<Utc>, instant: DateTime<Utc>) -> Result<i64, ScheduleError> {
    if instant.timestamp_subsec_nanos() != 0 || instant.timestamp() % 60 != 0 {
        return Err(ScheduleError::invalid_request(format!(
            "instant '{instant}' is not minute-aligned"
        )));
    }
    let delta = instant.signed_duration_since(horizon_start);
    Ok(delta.num_minutes())
}

/// Converts integer minutes since `horizon_start` back to an absolute instant.
pub fn to_instant(horizon_start: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
    horizon_start + Duration::minutes(minutes)
}

/// Validates and quantizes a [`Horizon`], returning its length in minutes (`H`).
///
/// This is the first place horizon instants are touched in the
/// pipeline, so the `start < end` invariant is enforced here.
pub fn quantize_horizon(horizon: &Horizon) -> Result<i64, ScheduleError> {
    if horizon.end <= horizon.start {
        return Err(ScheduleError::invalid_request(format!(
            "horizon end '{}' must be after horizon start '{}'",
            horizon.end, horizon.start
        )));
    }
    to_minutes(horizon.start, horizon.end)
}
