//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Round a f64 and clamp it to the i32 range, returning 0 for NaN values.
#[must_use]
pub fn round_f64_to_i32(value: f64) -> i32 {
    if value.is_nan() {
        return 0;
    }
    let min = cast::<i32, f64>(i32::MIN).unwrap_or(f64::MIN);
    let max = cast::<i32, f64>(i32::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(min, max).round();
    cast::<f64, i32>(clamped).unwrap_or(0)
}

/// Floor a f64 and clamp it to the u32 range, returning 0 for non-finite values.
#[must_use]
pub fn floor_f64_to_u32(value: f64) -> u32 {
    if !value.is_finite() {
        return 0;
    }
    let max = cast::<u32, f64>(u32::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(0.0, max).floor();
    cast::<f64, u32>(clamped).unwrap_or(0)
}

/// Floor a f64 and clamp it to the u64 range, returning 0 for non-finite values.
#[must_use]
pub fn floor_f64_to_u64(value: f64) -> u64 {
    if !value.is_finite() {
        return 0;
    }
    let max = cast::<u64, f64>(u64::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(0.0, max).floor();
    cast::<f64, u64>(clamped).unwrap_or(0)
}

/// Ceil a f64 and clamp it to the u32 range, returning 0 for non-finite values.
#[must_use]
pub fn ceil_f64_to_u32(value: f64) -> u32 {
    if !value.is_finite() {
        return 0;
    }
    let max = cast::<u32, f64>(u32::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(0.0, max).ceil();
    cast::<f64, u32>(clamped).unwrap_or(0)
}

/// Convert a dollar amount to integer cents, rounding to the nearest cent.
#[must_use]
pub fn dollars_to_cents(dollars: f64) -> i64 {
    if !dollars.is_finite() {
        return 0;
    }
    let min = cast::<i64, f64>(i64::MIN).unwrap_or(f64::MIN);
    let max = cast::<i64, f64>(i64::MAX).unwrap_or(f64::MAX);
    let clamped = (dollars * 100.0).clamp(min, max).round();
    cast::<f64, i64>(clamped).unwrap_or(0)
}

/// Convert integer cents to dollars while allowing precision loss in one place.
#[must_use]
pub fn cents_to_dollars(cents: i64) -> f64 {
    cast::<i64, f64>(cents).unwrap_or(0.0) / 100.0
}

/// Convert i64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn i64_to_f64(value: i64) -> f64 {
    cast::<i64, f64>(value).unwrap_or(0.0)
}

/// Convert u32 to f64 losslessly through the cast helper.
#[must_use]
pub fn u32_to_f64(value: u32) -> f64 {
    cast::<u32, f64>(value).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_handles_nan_and_range() {
        assert_eq!(round_f64_to_i32(f64::NAN), 0);
        assert_eq!(round_f64_to_i32(2.5), 3);
        assert_eq!(round_f64_to_i32(f64::MAX), i32::MAX);
    }

    #[test]
    fn money_round_trips_cents() {
        assert_eq!(dollars_to_cents(10_000.0), 1_000_000);
        assert_eq!(dollars_to_cents(99.995), 10_000);
        assert!((cents_to_dollars(1_000_000) - 10_000.0).abs() < f64::EPSILON);
        assert_eq!(dollars_to_cents(f64::INFINITY), 0);
    }

    #[test]
    fn floors_never_go_negative() {
        assert_eq!(floor_f64_to_u32(-3.2), 0);
        assert_eq!(floor_f64_to_u64(17.9), 17);
        assert_eq!(ceil_f64_to_u32(0.1), 1);
    }
}
