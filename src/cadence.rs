//! Closed-form walking/running cadence estimate from height and speed.

use std::fmt;

use crate::clients::errors::{Error, Result};

/// Stride length as a fraction of height at walking pace.
const BASE_STRIDE_RATIO: f64 = 0.414;
/// Upper bound on stride length as a fraction of height.
const MAX_STRIDE_RATIO: f64 = 0.55;
/// Roughly 5 mph; above this the stride starts to lengthen.
const REFERENCE_SPEED_MPS: f64 = 2.2;
/// Speed span over which the stride reaches its full lengthening.
const SPEED_SPAN_MPS: f64 = 1.8;
const MAX_LENGTHENING: f64 = 0.25;

/// Result of [`estimate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CadenceEstimate {
    /// Cadence in steps per minute.
    pub steps_per_minute: f64,
    /// Stride length in meters.
    pub stride_length_m: f64,
}

impl fmt::Display for CadenceEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Estimated cadence: {:.0} spm (step length: {:.2} m)",
            self.steps_per_minute, self.stride_length_m
        )
    }
}

/// Stride multiplier for a given speed: 1 up to the reference speed, then
/// growing linearly and capped at 1.25.
pub fn stride_scale(speed_mps: f64) -> f64 {
    if speed_mps > REFERENCE_SPEED_MPS {
        let scale = 1.0 + MAX_LENGTHENING * (speed_mps - REFERENCE_SPEED_MPS) / SPEED_SPAN_MPS;
        scale.min(1.0 + MAX_LENGTHENING)
    } else {
        1.0
    }
}

/// Estimate steps per minute and stride length.
///
/// Fails with [`Error::InvalidInputError`] when `height_m` is not a positive
/// finite number or `speed_mps` is negative or not finite.
pub fn estimate(height_m: f64, speed_mps: f64) -> Result<CadenceEstimate> {
    if !height_m.is_finite() || height_m <= 0.0 {
        return Err(Error::InvalidInputError(format!(
            "height must be a positive number of meters, got {height_m}"
        )));
    }
    if !speed_mps.is_finite() || speed_mps < 0.0 {
        return Err(Error::InvalidInputError(format!(
            "speed must be a non-negative number of m/s, got {speed_mps}"
        )));
    }

    let stride = (BASE_STRIDE_RATIO * height_m * stride_scale(speed_mps))
        .min(MAX_STRIDE_RATIO * height_m);

    Ok(CadenceEstimate {
        steps_per_minute: speed_mps / stride * 60.0,
        stride_length_m: stride,
    })
}
