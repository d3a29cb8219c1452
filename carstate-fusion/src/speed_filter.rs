//! Vehicle speed filter
//!
//! Two-state (speed, acceleration) constant-velocity Kalman filter with a fixed,
//! precomputed steady-state gain. Running at the control rate it smooths the raw
//! wheel-derived speed and yields an acceleration estimate.

/// Control loop period in seconds
pub const DT_CTRL: f64 = 0.01;

/// Steady-state gain for `DT_CTRL`
const GAIN: [f64; 2] = [0.12287673, 0.29666309];

/// Jumps larger than this (m/s) re-seed the filter instead of being tracked
const RESET_THRESHOLD: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedFilter {
    /// [speed, acceleration]
    x: [f64; 2],
    dt: f64,
}

impl SpeedFilter {
    pub fn new() -> Self {
        Self {
            x: [0.0, 0.0],
            dt: DT_CTRL,
        }
    }

    /// Feed one raw speed sample, returns (filtered speed, acceleration)
    pub fn update(&mut self, v_ego_raw: f64) -> (f64, f64) {
        // A car that starts at non-zero speed would otherwise report a huge acceleration
        if !self.x[0].is_finite() || !self.x[1].is_finite() || (v_ego_raw - self.x[0]).abs() > RESET_THRESHOLD {
            log::debug!("Speed filter reset: {:.3} -> {:.3} m/s", self.x[0], v_ego_raw);
            self.x = [v_ego_raw, 0.0];
        }

        // Predict
        let v_pred = self.x[0] + self.dt * self.x[1];
        let a_pred = self.x[1];

        // Correct
        let innovation = v_ego_raw - v_pred;
        self.x = [v_pred + GAIN[0] * innovation, a_pred + GAIN[1] * innovation];

        (self.x[0], self.x[1])
    }

    pub fn speed(&self) -> f64 {
        self.x[0]
    }

    pub fn acceleration(&self) -> f64 {
        self.x[1]
    }

    pub fn reset(&mut self) {
        self.x = [0.0, 0.0];
    }
}

impl Default for SpeedFilter {
    fn default() -> Self {
        Self::new()
    }
}
