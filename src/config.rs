//! Configuration models for star systems and flight tunables.

use serde::{Deserialize, Serialize};

use crate::celestial::body::TemperatureCategory;
use crate::constants::{
    CRASH_POWER_DIVISOR, CRASH_SPEED_THRESHOLD, FALLBACK_LANDING_ALTITUDE, LANDING_MIN_HEIGHT,
    LANDING_MIN_HEIGHT_ZERO_G, LANDING_THROTTLE_GATE, LAUNCH_G_LIMIT_FACTOR, MAX_EXPLOSION_POWER,
    MIN_LANDING_AGE, MIN_LAUNCH_G_LIMIT, ROTATION_RATE_DECAY, ROTATION_RATE_EPSILON,
    ROTATION_RATE_STEP, THROTTLE_STEP, TRAVEL_CEILING, TRAVEL_CEILING_ORBIT,
    UNDEREXPANSION_THRESHOLD, ZERO_G_SPEED,
};
use crate::errors::SimulationError;

/// A star system as read from a TOML manifest.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SystemConfig {
    #[serde(default)]
    pub bodies: Vec<BodyConfig>,
}

impl SystemConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, SimulationError> {
        Ok(toml::from_str(contents)?)
    }
}

/// Immutable description of one celestial body.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BodyConfig {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    /// Dimension identifier used as the body's surface, if it has one.
    #[serde(default)]
    pub dimension: Option<String>,
    pub mass: f64,
    pub radius: f64,
    /// Parking orbit altitude above the surface (m).
    pub parking_orbit_altitude: f64,
    #[serde(default)]
    pub orbit: OrbitConfig,
    #[serde(default)]
    pub rotation: RotationConfig,
    #[serde(default)]
    pub atmosphere: AtmosphereConfig,
}

/// Keplerian elements. Distances in meters, angles in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct OrbitConfig {
    #[serde(default)]
    pub periapsis: f64,
    #[serde(default)]
    pub apoapsis: f64,
    #[serde(default)]
    pub argument_of_periapsis: f64,
    #[serde(default)]
    pub true_anomaly: f64,
    #[serde(default)]
    pub ascending_node: f64,
    #[serde(default)]
    pub inclination: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct RotationConfig {
    #[serde(default)]
    pub tidally_locked: bool,
    #[serde(default)]
    pub obliquity: f64,
    /// rad/s
    #[serde(default)]
    pub rotation_rate: f64,
    /// rad/s
    #[serde(default)]
    pub precession_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct AtmosphereConfig {
    #[serde(default)]
    pub temperature: TemperatureCategory,
    /// Multiples of Earth sea-level pressure.
    #[serde(default)]
    pub surface_pressure: f64,
    #[serde(default)]
    pub has_oxygen: bool,
    #[serde(default)]
    pub has_low_clouds: bool,
    #[serde(default)]
    pub has_cloud_cover: bool,
    #[serde(default)]
    pub has_weather: bool,
}

impl Default for AtmosphereConfig {
    fn default() -> Self {
        AtmosphereConfig {
            temperature: TemperatureCategory::Temperate,
            surface_pressure: 0.0,
            has_oxygen: false,
            has_low_clouds: false,
            has_cloud_cover: false,
            has_weather: false,
        }
    }
}

/// Tunables of the vehicle flight model.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FlightConfig {
    pub travel_ceiling: f64,
    pub travel_ceiling_orbit: f64,
    pub zero_g_speed: f64,
    pub min_launch_g_limit: f64,
    pub launch_g_limit_factor: f64,
    pub landing_throttle_gate: f64,
    pub landing_min_height: f64,
    pub landing_min_height_zero_g: f64,
    pub fallback_landing_altitude: i32,
    pub min_landing_age: u32,
    pub crash_speed_threshold: f64,
    pub crash_power_divisor: f64,
    pub max_explosion_power: f64,
    pub underexpansion_threshold: f64,
    pub throttle_step: f64,
    pub rotation_rate_step: f64,
    pub rotation_rate_decay: f64,
    pub rotation_rate_epsilon: f64,
}

impl Default for FlightConfig {
    fn default() -> Self {
        FlightConfig {
            travel_ceiling: TRAVEL_CEILING,
            travel_ceiling_orbit: TRAVEL_CEILING_ORBIT,
            zero_g_speed: ZERO_G_SPEED,
            min_launch_g_limit: MIN_LAUNCH_G_LIMIT,
            launch_g_limit_factor: LAUNCH_G_LIMIT_FACTOR,
            landing_throttle_gate: LANDING_THROTTLE_GATE,
            landing_min_height: LANDING_MIN_HEIGHT,
            landing_min_height_zero_g: LANDING_MIN_HEIGHT_ZERO_G,
            fallback_landing_altitude: FALLBACK_LANDING_ALTITUDE,
            min_landing_age: MIN_LANDING_AGE,
            crash_speed_threshold: CRASH_SPEED_THRESHOLD,
            crash_power_divisor: CRASH_POWER_DIVISOR,
            max_explosion_power: MAX_EXPLOSION_POWER,
            underexpansion_threshold: UNDEREXPANSION_THRESHOLD,
            throttle_step: THROTTLE_STEP,
            rotation_rate_step: ROTATION_RATE_STEP,
            rotation_rate_decay: ROTATION_RATE_DECAY,
            rotation_rate_epsilon: ROTATION_RATE_EPSILON,
        }
    }
}

impl FlightConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, SimulationError> {
        Ok(toml::from_str(contents)?)
    }

    /// Altitude above which a craft leaves for its destination.
    pub fn ceiling(&self, in_orbit: bool) -> f64 {
        if in_orbit {
            self.travel_ceiling_orbit
        } else {
            self.travel_ceiling
        }
    }
}
