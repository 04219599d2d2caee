//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

use crate::constants::MS_PER_MINUTE;

/// Round a f64 and clamp it to the u64 range, returning 0 for NaN values.
#[must_use]
pub fn round_f64_to_u64(value: f64) -> u64 {
    if value.is_nan() {
        return 0;
    }
    let max = cast::<u64, f64>(u64::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(0.0, max).round();
    cast::<f64, u64>(clamped).unwrap_or(0)
}

/// Round a f64 and clamp it to the i64 range, returning 0 for non-finite values.
#[must_use]
pub fn round_f64_to_i64(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    let min = cast::<i64, f64>(i64::MIN).unwrap_or(f64::MIN);
    let max = cast::<i64, f64>(i64::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(min, max).round();
    cast::<f64, i64>(clamped).unwrap_or(0)
}

/// Convert i64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn i64_to_f64(value: i64) -> f64 {
    cast::<i64, f64>(value).unwrap_or(0.0)
}

/// Convert usize to f64 while allowing precision loss in a single location.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

/// Map a unit draw onto `[0, len)`, clamping stray values to the last slot.
///
/// Returns `None` for an empty range.
#[must_use]
pub fn scale_to_index(unit: f64, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let scaled = (unit.clamp(0.0, 1.0) * usize_to_f64(len)).floor();
    let index = cast::<f64, usize>(scaled).unwrap_or(0);
    Some(index.min(len - 1))
}

/// Milliseconds to fractional minutes.
#[must_use]
pub fn ms_to_minutes(ms: i64) -> f64 {
    i64_to_f64(ms) / i64_to_f64(MS_PER_MINUTE)
}

/// Fractional minutes to whole milliseconds.
#[must_use]
pub fn minutes_to_ms(minutes: f64) -> i64 {
    round_f64_to_i64(minutes * i64_to_f64(MS_PER_MINUTE))
}
