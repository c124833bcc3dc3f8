use serde::{Deserialize, Serialize};

use crate::celestial::body::BodyHandle;
use crate::celestial::system::CelestialBodyModel;
use crate::constants::STANDARD_GRAVITY;
use crate::errors::SimulationError;

/// What the host knows about one dimension: the body it belongs to and
/// whether it is the body's surface or its parking orbit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionData {
    pub body: BodyHandle,
    pub is_orbit: bool,
    /// Multiples of Earth sea-level pressure.
    pub pressure: f64,
}

impl DimensionData {
    /// Pressure felt by thrusters; zero in orbit.
    pub fn effective_pressure(&self) -> f64 {
        if self.is_orbit {
            0.0
        } else {
            self.pressure
        }
    }
}

/// Local conditions around a vehicle for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub gravity: f64,
    pub pressure: f64,
    pub in_orbit: bool,
    pub body: Option<BodyHandle>,
}

impl Default for Environment {
    /// Earth sea level, used when the host has no data for a dimension.
    fn default() -> Self {
        Environment {
            gravity: STANDARD_GRAVITY,
            pressure: 1.0,
            in_orbit: false,
            body: None,
        }
    }
}

impl Environment {
    pub fn resolve(
        data: Option<&DimensionData>,
        bodies: &CelestialBodyModel,
    ) -> Result<Self, SimulationError> {
        let Some(data) = data else {
            return Ok(Environment::default());
        };

        if data.is_orbit {
            return Ok(Environment {
                gravity: 0.0,
                pressure: 0.0,
                in_orbit: true,
                body: Some(data.body),
            });
        }

        let body = bodies.get(data.body)?;
        Ok(Environment {
            gravity: STANDARD_GRAVITY * body.surface_gravity(),
            pressure: data.pressure,
            in_orbit: false,
            body: Some(data.body),
        })
    }

    pub fn is_weightless(&self) -> bool {
        self.gravity == 0.0
    }
}
