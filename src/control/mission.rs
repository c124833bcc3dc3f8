//! Pre-launch scan of a craft and selection of its flight plan.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::celestial::system::CelestialBodyModel;
use crate::constants::STANDARD_GRAVITY;
use crate::control::assembly::CapturedBlock;
use crate::control::fuel_management::{available_delta_v, propellant_for_delta_v, PropellantTanks};
use crate::control::host::EnvironmentProvider;
use crate::control::pilot::Cardinal;
use crate::errors::{ensure_finite, SimulationError};

/// Performance figures of a craft on its pad, as the rocket controller
/// reports them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleScan {
    pub mass: f64,
    pub thrust: f64,
    pub thrust_vacuum: f64,
    pub average_exhaust_velocity: f64,
    pub average_exhaust_velocity_vacuum: f64,
    pub tanks: PropellantTanks,
    pub delta_v: f64,
    /// Delta-v with every tank full.
    pub delta_v_capacity: f64,
}

impl VehicleScan {
    pub fn from_blocks(blocks: &[CapturedBlock], pressure: f64) -> Result<Self, SimulationError> {
        let mass: f64 = blocks.iter().map(CapturedBlock::total_mass).sum();
        let tanks = PropellantTanks::from_blocks(blocks);

        let mut thrust = 0.0;
        let mut thrust_vacuum = 0.0;
        let mut mass_flow = 0.0;
        for thruster in blocks.iter().filter_map(CapturedBlock::active_thruster) {
            thrust += thruster.thrust(pressure);
            thrust_vacuum += thruster.thrust(0.0);
            mass_flow += thruster.mass_flow();
        }
        if mass_flow == 0.0 {
            return Err(SimulationError::PreconditionViolation(
                "scanned craft has no active thrusters".to_string(),
            ));
        }

        let average_exhaust_velocity =
            ensure_finite(STANDARD_GRAVITY * thrust / mass_flow, "exhaust velocity")?;
        let average_exhaust_velocity_vacuum =
            ensure_finite(STANDARD_GRAVITY * thrust_vacuum / mass_flow, "vacuum exhaust velocity")?;
        let delta_v = available_delta_v(mass, &tanks, average_exhaust_velocity_vacuum)?;
        let delta_v_capacity = available_delta_v(
            mass + tanks.missing_propellant(),
            &tanks.full(),
            average_exhaust_velocity_vacuum,
        )?;

        Ok(VehicleScan {
            mass,
            thrust,
            thrust_vacuum,
            average_exhaust_velocity,
            average_exhaust_velocity_vacuum,
            tanks,
            delta_v,
            delta_v_capacity,
        })
    }
}

/// Where on the destination a craft should come down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrivalSite {
    pub x: i32,
    /// Landing height; probed from the terrain on arrival when unknown.
    pub y: Option<i32>,
    pub z: i32,
    pub direction: Cardinal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightPlan {
    pub destination: String,
    pub required_delta_v: f64,
    /// Propellant budgeted for the whole trip, kg.
    pub fuel_to_use: f64,
    pub arrival: Option<ArrivalSite>,
}

impl FlightPlan {
    /// Budgets a trip from `origin` to `destination` dimension.
    ///
    /// From a surface the only trip is up to the parking orbit. From orbit a
    /// craft either lands on the body below or transfers to another body.
    pub fn select(
        model: &CelestialBodyModel,
        environments: &impl EnvironmentProvider,
        origin: &str,
        destination: &str,
        scan: &VehicleScan,
        arrival: Option<ArrivalSite>,
    ) -> Result<Self, SimulationError> {
        let origin_data = environments
            .environment(origin)
            .ok_or_else(|| SimulationError::NotFound(format!("dimension '{origin}'")))?;
        let destination_data = environments
            .environment(destination)
            .ok_or_else(|| SimulationError::NotFound(format!("dimension '{destination}'")))?;

        let required_delta_v = if !origin_data.is_orbit {
            model.surface_to_orbit_delta_v(origin_data.body)?
        } else if destination_data.body == origin_data.body && !destination_data.is_orbit {
            model.orbit_to_surface_delta_v(origin_data.body)?
        } else {
            model.delta_v_between(origin_data.body, destination_data.body)?
        };

        let fuel_to_use = propellant_for_delta_v(
            scan.mass,
            required_delta_v,
            scan.average_exhaust_velocity_vacuum,
        )?;
        debug!(
            origin,
            destination,
            required_delta_v,
            fuel_to_use,
            "Selected flight plan"
        );

        Ok(FlightPlan {
            destination: destination.to_string(),
            required_delta_v,
            fuel_to_use,
            arrival,
        })
    }

    pub fn is_affordable(&self, scan: &VehicleScan) -> bool {
        scan.delta_v >= self.required_delta_v
    }
}
