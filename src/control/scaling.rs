//! # Scaling Module
//!
//! Maps raw stick and trigger readings to PWM duty values.
//!
//! ## Deadzone
//!
//! Magnitudes at or below the deadzone edge map to zero duty. Above it the
//! remaining range up to `max_input` is spread linearly over `0..=duty_max`:
//!
//! `duty = round((|raw| - deadzone_hi) * duty_max / (max_input - deadzone_hi))`
//!
//! Triggers use the same function with both deadzone edges at zero.
//!
//! ## Rounding
//!
//! Exact integer arithmetic, rounding half away from zero. A quotient of
//! exactly `n + 0.5` always yields `n + 1`.
//!
//! ## Usage
//!
//! ```
//! use rc_car_bridge::control::scaling::scale;
//!
//! // Steering: deadzone edge 115, full lock at 512
//! assert_eq!(scale(115, 30, 115, 512, 3200), 0);
//! assert_eq!(scale(512, 30, 115, 512, 3200), 3200);
//!
//! // Trigger: no deadzone
//! assert_eq!(scale(510, 0, 0, 1020, 3200), 1600);
//! ```

/// Scales a raw reading to a duty in `[0, duty_max]`.
///
/// # Arguments
///
/// * `raw` - Signed axis or unsigned trigger reading; only `|raw|` is used
/// * `deadzone_lo` - Neutral zone edge; magnitudes at or below map to 0
/// * `deadzone_hi` - Activation edge; duty starts at 0 here
/// * `max_input` - Magnitude that maps to `duty_max`
/// * `duty_max` - PWM period in ticks
///
/// Magnitudes beyond `max_input` clamp to `duty_max`. A degenerate range
/// (`max_input <= deadzone_hi`) maps anything past the deadzone to
/// `duty_max` instead of dividing by zero.
#[must_use]
pub fn scale(raw: i64, deadzone_lo: i64, deadzone_hi: i64, max_input: i64, duty_max: u32) -> u32 {
    let magnitude = raw.unsigned_abs();
    let lo = deadzone_lo.unsigned_abs();
    let hi = deadzone_hi.unsigned_abs().max(lo);
    let max = max_input.unsigned_abs();

    if magnitude <= hi {
        return 0;
    }
    if max <= hi || magnitude >= max {
        return duty_max;
    }

    let numerator = u128::from(magnitude - hi) * u128::from(duty_max);
    let denominator = u128::from(max - hi);
    let duty = round_half_away(numerator, denominator);

    // duty <= duty_max because magnitude < max; keep the clamp anyway
    u32::try_from(duty).map_or(duty_max, |d| d.min(duty_max))
}

/// `numerator / denominator` rounded half away from zero.
#[inline]
fn round_half_away(numerator: u128, denominator: u128) -> u128 {
    (2 * numerator + denominator) / (2 * denominator)
}

/// Steering duty for an axis reading with the given activation edge.
#[must_use]
pub fn steering_duty(axis_x: i32, coast_band: i32, turn_threshold: i32, max_input: i32, duty_max: u32) -> u32 {
    scale(
        i64::from(axis_x),
        i64::from(coast_band),
        i64::from(turn_threshold),
        i64::from(max_input),
        duty_max,
    )
}

/// Drive duty for a trigger reading, no deadzone.
#[must_use]
pub fn trigger_duty(value: u32, trigger_max: u32, duty_max: u32) -> u32 {
    scale(i64::from(value), 0, 0, i64::from(trigger_max), duty_max)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUTY_MAX: u32 = 3200;

    #[test]
    fn test_steering_deadzone_edge_is_zero() {
        assert_eq!(steering_duty(115, 30, 115, 512, DUTY_MAX), 0);
        assert_eq!(steering_duty(-115, 30, 115, 512, DUTY_MAX), 0);
    }

    #[test]
    fn test_steering_symmetric_around_zero() {
        for raw in [116, 200, 300, 400, 511, 512] {
            assert_eq!(
                steering_duty(raw, 30, 115, 512, DUTY_MAX),
                steering_duty(-raw, 30, 115, 512, DUTY_MAX),
                "asymmetric at {}",
                raw
            );
        }
    }

    #[test]
    fn test_steering_full_lock() {
        assert_eq!(steering_duty(512, 30, 115, 512, DUTY_MAX), DUTY_MAX);
        assert_eq!(steering_duty(-512, 30, 115, 512, DUTY_MAX), DUTY_MAX);
    }

    #[test]
    fn test_steering_at_400() {
        // 285 * 3200 / 397 = 2297.23
        assert_eq!(steering_duty(400, 30, 115, 512, DUTY_MAX), 2297);
    }

    #[test]
    fn test_steering_just_past_edge() {
        // 1 * 3200 / 397 = 8.06
        assert_eq!(steering_duty(116, 30, 115, 512, DUTY_MAX), 8);
    }

    #[test]
    fn test_inside_deadzone_is_zero() {
        assert_eq!(steering_duty(0, 30, 115, 512, DUTY_MAX), 0);
        assert_eq!(steering_duty(30, 30, 115, 512, DUTY_MAX), 0);
        assert_eq!(steering_duty(-100, 30, 115, 512, DUTY_MAX), 0);
    }

    #[test]
    fn test_out_of_range_input_clamps() {
        assert_eq!(steering_duty(2000, 30, 115, 512, DUTY_MAX), DUTY_MAX);
        assert_eq!(steering_duty(i32::MIN, 30, 115, 512, DUTY_MAX), DUTY_MAX);
        assert_eq!(trigger_duty(u32::MAX, 1020, DUTY_MAX), DUTY_MAX);
        assert_eq!(trigger_duty(1500, 1020, DUTY_MAX), DUTY_MAX);
    }

    #[test]
    fn test_trigger_scaling() {
        assert_eq!(trigger_duty(0, 1020, DUTY_MAX), 0);
        assert_eq!(trigger_duty(510, 1020, DUTY_MAX), 1600);
        assert_eq!(trigger_duty(1020, 1020, DUTY_MAX), DUTY_MAX);
        // 100 * 3200 / 1020 = 313.7
        assert_eq!(trigger_duty(100, 1020, DUTY_MAX), 314);
        // 1 * 3200 / 1020 = 3.137
        assert_eq!(trigger_duty(1, 1020, DUTY_MAX), 3);
    }

    #[test]
    fn test_ties_round_away_from_zero() {
        // 1 * 1 / 2 = 0.5
        assert_eq!(scale(1, 0, 0, 2, 1), 1);
        // 3 * 2 / 4 = 1.5
        assert_eq!(scale(3, 0, 0, 4, 2), 2);
        // 5 * 1 / 10 = 0.5, negative input uses magnitude
        assert_eq!(scale(-5, 0, 0, 10, 1), 1);
        // 2.5 with a deadzone: (15 - 10) * 5 / 10
        assert_eq!(scale(15, 0, 10, 20, 5), 3);
    }

    #[test]
    fn test_below_half_rounds_down() {
        // 1 * 4 / 10 = 0.4
        assert_eq!(scale(1, 0, 0, 10, 4), 0);
        // 1 * 6 / 10 = 0.6
        assert_eq!(scale(1, 0, 0, 10, 6), 1);
    }

    #[test]
    fn test_degenerate_range_never_divides_by_zero() {
        assert_eq!(scale(200, 0, 115, 115, DUTY_MAX), DUTY_MAX);
        assert_eq!(scale(200, 0, 115, 0, DUTY_MAX), DUTY_MAX);
        assert_eq!(scale(100, 0, 115, 0, DUTY_MAX), 0);
        assert_eq!(scale(0, 0, 0, 0, DUTY_MAX), 0);
    }

    #[test]
    fn test_zero_duty_max() {
        assert_eq!(scale(400, 30, 115, 512, 0), 0);
        assert_eq!(trigger_duty(1020, 1020, 0), 0);
    }

    #[test]
    fn test_monotonic_over_active_range() {
        let mut previous = 0;
        for raw in 115..=512 {
            let duty = steering_duty(raw, 30, 115, 512, DUTY_MAX);
            assert!(duty >= previous, "duty decreased at {}", raw);
            assert!(duty <= DUTY_MAX);
            previous = duty;
        }
    }
}
