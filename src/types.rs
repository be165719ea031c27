use strum_macros::EnumIter;

#[derive(Debug, EnumIter, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Axis {
    Pan,
    Tilt,
    Roll,
}

impl Axis {
    pub fn name(&self) -> &'static str {
        match self {
            Axis::Pan => "pan",
            Axis::Tilt => "tilt",
            Axis::Roll => "roll",
        }
    }
}

/// One joystick sample, one value per axis. Values are normalized to
/// [-1, 1] by `clamped()`; raw input may arrive outside that range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlInput {
    pub pan: f64,
    pub tilt: f64,
    pub roll: f64,
}

impl ControlInput {
    pub fn new(pan: f64, tilt: f64, roll: f64) -> Self {
        ControlInput { pan, tilt, roll }
    }

    pub fn axis(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Pan => self.pan,
            Axis::Tilt => self.tilt,
            Axis::Roll => self.roll,
        }
    }

    /// Non-finite axis values cannot be clamped meaningfully; callers must
    /// reject them before the input reaches the codec.
    pub fn is_finite(&self) -> bool {
        self.pan.is_finite() && self.tilt.is_finite() && self.roll.is_finite()
    }

    pub fn clamped(&self) -> Self {
        ControlInput {
            pan: clamp_axis(self.pan),
            tilt: clamp_axis(self.tilt),
            roll: clamp_axis(self.roll),
        }
    }

    pub fn is_rest(&self) -> bool {
        self.pan == 0.0 && self.tilt == 0.0 && self.roll == 0.0
    }
}

pub(crate) fn clamp_axis(value: f64) -> f64 {
    use crate::constants::{MAX_AXIS, MIN_AXIS};
    value.max(MIN_AXIS).min(MAX_AXIS)
}
