//! Services the host world provides to the flight simulation.

use glam::{DVec3, IVec3};
use serde::{Deserialize, Serialize};

use crate::control::assembly::CapturedBlock;
use crate::control::environment::DimensionData;
use crate::errors::SimulationError;
use crate::telemetry_system::telemetry::TelemetrySnapshot;
use crate::trajectory_system::kinematics::{Aabb, MoveOutcome};

/// Opaque identity of a vehicle in the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VehicleHandle(pub u64);

pub trait EnvironmentProvider {
    fn environment(&self, dimension: &str) -> Option<DimensionData>;
}

pub trait BlockManifestProvider {
    /// Blocks making up the vehicle, in world coordinates.
    fn blocks(&self, vehicle: VehicleHandle) -> Result<Vec<CapturedBlock>, SimulationError>;

    /// Turns blocks back into static world blocks around `origin`, rotated
    /// by `rotation_steps` quarter turns.
    fn place_blocks(
        &mut self,
        vehicle: VehicleHandle,
        dimension: &str,
        origin: IVec3,
        blocks: &[CapturedBlock],
        rotation_steps: u8,
    ) -> Result<(), SimulationError>;
}

pub trait WorldProbe {
    /// Moves `bounds` by `displacement` as far as terrain allows.
    fn move_bounds(&mut self, dimension: &str, bounds: Aabb, displacement: DVec3) -> MoveOutcome;

    /// Height of the top face of the highest solid block in a column.
    fn solid_ground_below(&self, dimension: &str, x: i32, z: i32) -> Option<i32>;

    fn air_resistance_multiplier(&self, dimension: &str, position: DVec3) -> f64;

    fn explode(&mut self, dimension: &str, at: DVec3, power: f64);
}

pub trait TelemetrySink {
    fn publish(&mut self, vehicle: VehicleHandle, snapshot: &TelemetrySnapshot);
}

/// Everything a vehicle needs from its host each tick.
pub trait FlightHost: EnvironmentProvider + BlockManifestProvider + WorldProbe + TelemetrySink {}

impl<T> FlightHost for T where T: EnvironmentProvider + BlockManifestProvider + WorldProbe + TelemetrySink {}
