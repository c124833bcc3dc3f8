//! Flat records written at tick boundaries and read back on restart.
//!
//! The encoding is left to the host; every record derives `serde` traits.

use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

use crate::control::environment::Environment;
use crate::control::fuel_management::PropellantTanks;
use crate::control::host::VehicleHandle;
use crate::control::mission::ArrivalSite;
use crate::control::pilot::{Cardinal, ControlInput, RotationRates};
use crate::control::propulsion::PropulsionSystem;
use crate::control::rocket::FlightPhase;

/// Evolving state of one celestial body. Orbital elements are not stored;
/// they come back from the system configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyRecord {
    pub position: DVec3,
    pub velocity: DVec3,
    pub rotation: f64,
    pub precession: f64,
    pub parking_orbit_angle: f64,
}

/// Everything a rocket needs to resume flight, except its blocks, which
/// the host's block manifest keeps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleRecord {
    pub handle: VehicleHandle,
    pub dimension: String,
    pub destination: String,
    pub fuel_to_use: f64,
    pub arrival: ArrivalSite,
    pub forward: Cardinal,
    pub lower_height: f64,
    pub upper_height: f64,
    pub max_width: f64,
    pub position: DVec3,
    pub velocity: DVec3,
    pub orientation: DQuat,
    pub throttle: f64,
    pub rates: RotationRates,
    pub input: ControlInput,
    pub user_input: bool,
    pub changed_dimension: bool,
    pub craft_mass: f64,
    pub craft_mass_initial: f64,
    pub tanks: PropellantTanks,
    pub propulsion: PropulsionSystem,
    pub environment: Environment,
    pub phase: FlightPhase,
    pub age: u32,
}
