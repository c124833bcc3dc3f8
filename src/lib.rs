pub mod celestial;
pub mod config;
pub mod constants;
pub mod control;
pub mod errors;
pub mod persistence;
pub mod telemetry_system;
pub mod trajectory_system;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

pub use celestial::body::{BodyHandle, CelestialBody, TemperatureCategory};
pub use celestial::system::CelestialBodyModel;
pub use config::{BodyConfig, FlightConfig, SystemConfig};
pub use constants::*;
pub use errors::SimulationError;
pub use persistence::{BodyRecord, VehicleRecord};

// Re-export commonly used items from control
pub use control::assembly::{BlockKind, CapturedBlock, FlyingAssembly};
pub use control::environment::{DimensionData, Environment};
pub use control::host::{
    BlockManifestProvider, EnvironmentProvider, FlightHost, TelemetrySink, VehicleHandle,
    WorldProbe,
};
pub use control::mission::{ArrivalSite, FlightPlan, VehicleScan};
pub use control::pilot::{Cardinal, ControlInput};
pub use control::propulsion::ThrusterSpec;
pub use control::rocket::{FlightPhase, Rocket};
pub use control::scheduler::{FlightScheduler, TickReport};

// Re-export commonly used items from trajectory_system
pub use trajectory_system::kinematics::{Aabb, Kinematics, MoveOutcome};

// Re-export commonly used items from telemetry_system
pub use telemetry_system::telemetry::{FlightRecorder, TelemetrySnapshot};
