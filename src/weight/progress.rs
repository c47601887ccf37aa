/// Share of body weight lost between two measurements, in percent.
///
/// Positive when weight went down, negative when it went up. A zero
/// starting weight yields 0 so callers never divide by zero.
pub fn progress(initial: f64, current: f64) -> f64 {
    if initial == 0.0 {
        return 0.0;
    }
    ((initial - current) / initial) * 100.0
}

/// Body mass index from weight in kilograms and height in centimeters.
/// Returns 0 when the height is unknown.
pub fn bmi(weight_kg: f64, height_cm: f64) -> f64 {
    if height_cm == 0.0 {
        return 0.0;
    }
    let height_m = height_cm / 100.0;
    weight_kg / (height_m * height_m)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_share_of_initial_weight() {
        assert_eq!(progress(100.0, 90.0), 10.0);
    }

    #[test]
    fn progress_is_negative_when_weight_goes_up() {
        let v = progress(70.0, 86.0);
        assert!((v - (-22.857142857142858)).abs() < 1e-9);
    }

    #[test]
    fn progress_with_zero_initial_is_zero() {
        assert_eq!(progress(0.0, 50.0), 0.0);
    }

    #[test]
    fn progress_with_equal_weights_is_zero() {
        assert_eq!(progress(82.0, 82.0), 0.0);
    }

    #[test]
    fn bmi_for_known_case() {
        let v = bmi(75.0, 180.0);
        assert!((v - 23.148148148148145).abs() < 1e-9);
    }

    #[test]
    fn bmi_with_zero_height_is_zero() {
        assert_eq!(bmi(80.0, 0.0), 0.0);
    }
}
