//! Speed unit conversions and cruise setpoint unit detection

/// km/h to m/s
pub const KPH_TO_MS: f64 = 1.0 / 3.6;
/// m/s to km/h
pub const MS_TO_KPH: f64 = 3.6;
/// mph to m/s
pub const MPH_TO_MS: f64 = 1.609344 / 3.6;
/// m/s to mph
pub const MS_TO_MPH: f64 = 3.6 / 1.609344;

/// Default tolerance when matching a setpoint/speed ratio against a unit factor
pub const DEFAULT_UNIT_MATCH_TOLERANCE: f64 = 0.3;

/// Infer the unit the cruise setpoint is reported in.
///
/// Compares `setpoint / v_ego_raw` with the km/h and mph factors. Returns
/// `Some(true)` for metric, `Some(false)` for imperial and `None` when neither
/// matches or the speed is too low to divide by.
pub fn detect_metric(setpoint: f64, v_ego_raw: f64, tolerance: f64) -> Option<bool> {
    if !(v_ego_raw > 0.0) {
        return None;
    }

    let ratio = setpoint / v_ego_raw;
    if (ratio - MS_TO_KPH).abs() < tolerance {
        Some(true)
    } else if (ratio - MS_TO_MPH).abs() < tolerance {
        Some(false)
    } else {
        None
    }
}

/// Cruise setpoint in m/s
pub fn setpoint_to_ms(setpoint: f64, is_metric: bool) -> f64 {
    if is_metric {
        setpoint * KPH_TO_MS
    } else {
        setpoint * MPH_TO_MS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn test_conversion_constants() {
        assert_close(KPH_TO_MS * MS_TO_KPH, 1.0);
        assert_close(MPH_TO_MS * MS_TO_MPH, 1.0);
        assert_close(MPH_TO_MS, 0.44704);
    }

    #[test]
    fn test_detect_metric() {
        // 100 km/h setpoint while driving 100 km/h
        let v = 100.0 * KPH_TO_MS;
        assert_eq!(detect_metric(100.0, v, DEFAULT_UNIT_MATCH_TOLERANCE), Some(true));
    }

    #[test]
    fn test_detect_imperial() {
        // 60 mph setpoint while driving 60 mph
        let v = 60.0 * MPH_TO_MS;
        assert_eq!(detect_metric(60.0, v, DEFAULT_UNIT_MATCH_TOLERANCE), Some(false));
    }

    #[test]
    fn test_detect_ambiguous() {
        // Setpoint far from current speed in both units
        assert_eq!(detect_metric(120.0, 10.0, DEFAULT_UNIT_MATCH_TOLERANCE), None);
    }

    #[test]
    fn test_detect_skips_zero_speed() {
        assert_eq!(detect_metric(252.0, 0.0, DEFAULT_UNIT_MATCH_TOLERANCE), None);
        assert_eq!(detect_metric(252.0, -0.5, DEFAULT_UNIT_MATCH_TOLERANCE), None);
        assert_eq!(detect_metric(252.0, f64::NAN, DEFAULT_UNIT_MATCH_TOLERANCE), None);
    }

    #[test]
    fn test_setpoint_to_ms() {
        assert_close(setpoint_to_ms(36.0, true), 10.0);
        assert_close(setpoint_to_ms(10.0, false), 4.4704);
    }
}
