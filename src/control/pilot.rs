//! Manual flight controls.

use glam::DQuat;
use serde::{Deserialize, Serialize};

use crate::config::FlightConfig;
use crate::errors::SimulationError;
use crate::utils::vector_math::{euler_xyz, snap_to_zero};

/// Horizontal facing, numbered the way the host numbers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinal {
    South,
    West,
    North,
    East,
}

impl Cardinal {
    pub fn from_horizontal(index: i32) -> Self {
        match index.rem_euclid(4) {
            0 => Cardinal::South,
            1 => Cardinal::West,
            2 => Cardinal::North,
            _ => Cardinal::East,
        }
    }

    pub fn horizontal(self) -> i32 {
        match self {
            Cardinal::South => 0,
            Cardinal::West => 1,
            Cardinal::North => 2,
            Cardinal::East => 3,
        }
    }

    pub fn opposite(self) -> Self {
        Cardinal::from_horizontal(self.horizontal() + 2)
    }

    /// Yaw in degrees, south = 0.
    pub fn rotation_degrees(self) -> f64 {
        f64::from(self.horizontal()) * 90.0
    }
}

/// One pilot command frame: throttle in `-2..=2`, the three axes in `-1..=1`.
///
/// Throttle `±1` nudges, `±2` snaps to full or off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlInput {
    pub throttle: i8,
    pub roll: i8,
    pub pitch: i8,
    pub yaw: i8,
}

impl ControlInput {
    pub fn new(throttle: i32, roll: i32, pitch: i32, yaw: i32) -> Result<Self, SimulationError> {
        let axis = |value: i32, name: &str| {
            if (-1..=1).contains(&value) {
                Ok(value as i8)
            } else {
                Err(SimulationError::PreconditionViolation(format!(
                    "{name} command must be in -1..=1, got {value}"
                )))
            }
        };
        if !(-2..=2).contains(&throttle) {
            return Err(SimulationError::PreconditionViolation(format!(
                "throttle command must be in -2..=2, got {throttle}"
            )));
        }
        Ok(ControlInput {
            throttle: throttle as i8,
            roll: axis(roll, "roll")?,
            pitch: axis(pitch, "pitch")?,
            yaw: axis(yaw, "yaw")?,
        })
    }

    pub fn is_neutral(&self) -> bool {
        self.throttle == 0 && self.roll == 0 && self.pitch == 0 && self.yaw == 0
    }
}

pub fn apply_throttle_command(throttle: f64, command: i8, step: f64) -> f64 {
    let throttle = match command {
        1 => throttle + step,
        -1 => throttle - step,
        2 => 1.0,
        -2 => 0.0,
        _ => throttle,
    };
    throttle.clamp(0.0, 1.0)
}

/// Angular rates in radians per tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RotationRates {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl RotationRates {
    /// Accelerates each commanded axis by one step and lets the others decay.
    pub fn update(&mut self, input: &ControlInput, forward: Cardinal, config: &FlightConfig) {
        let step = config.rotation_rate_step;
        let roll_step = if matches!(forward, Cardinal::North | Cardinal::West) {
            -step
        } else {
            step
        };
        let pitch_step = if matches!(forward, Cardinal::South | Cardinal::West) {
            -step
        } else {
            step
        };

        let axis = |rate: f64, command: i8, step: f64| match command {
            1 => rate + step,
            -1 => rate - step,
            _ => rate * config.rotation_rate_decay,
        };
        self.roll = snap_to_zero(axis(self.roll, input.roll, roll_step), config.rotation_rate_epsilon);
        self.pitch = snap_to_zero(
            axis(self.pitch, input.pitch, pitch_step),
            config.rotation_rate_epsilon,
        );
        self.yaw = snap_to_zero(axis(self.yaw, input.yaw, step), config.rotation_rate_epsilon);
    }

    /// Rotation applied this tick. Roll and pitch swap axes for craft facing
    /// north or south.
    pub fn rotation_step(&self, forward: Cardinal) -> DQuat {
        if matches!(forward, Cardinal::North | Cardinal::South) {
            euler_xyz(self.pitch, self.yaw, self.roll)
        } else {
            euler_xyz(self.roll, self.yaw, self.pitch)
        }
    }

    pub fn is_zero(&self) -> bool {
        self.roll == 0.0 && self.pitch == 0.0 && self.yaw == 0.0
    }
}
