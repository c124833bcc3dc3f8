//! Shared fixtures for unit tests.

use std::collections::HashMap;

use glam::{DVec3, IVec3};

use crate::celestial::system::CelestialBodyModel;
use crate::config::{AtmosphereConfig, BodyConfig, OrbitConfig, RotationConfig};
use crate::control::assembly::CapturedBlock;
use crate::control::environment::DimensionData;
use crate::control::host::{
    BlockManifestProvider, EnvironmentProvider, TelemetrySink, VehicleHandle, WorldProbe,
};
use crate::errors::SimulationError;
use crate::telemetry_system::telemetry::TelemetrySnapshot;
use crate::trajectory_system::kinematics::{Aabb, MoveOutcome};

/// Body on a circular orbit of radius `distance` with a parking orbit one
/// tenth of its radius above the surface. Its dimension shares its name.
pub(crate) fn body(
    name: &str,
    parent: Option<&str>,
    mass: f64,
    radius: f64,
    distance: f64,
) -> BodyConfig {
    BodyConfig {
        name: name.to_string(),
        parent: parent.map(str::to_string),
        dimension: Some(name.to_string()),
        mass,
        radius,
        parking_orbit_altitude: radius / 10.0,
        orbit: OrbitConfig {
            periapsis: distance,
            apoapsis: distance,
            ..OrbitConfig::default()
        },
        rotation: RotationConfig::default(),
        atmosphere: AtmosphereConfig::default(),
    }
}

fn planet() -> BodyConfig {
    let mut planet = body("planet", Some("sol"), 5.97e24, 6.378e6, 1.496e11);
    planet.atmosphere.surface_pressure = 1.0;
    planet.atmosphere.has_oxygen = true;
    planet
}

/// Star, planet and moon, linked but not yet initialized.
pub(crate) fn three_body_chain() -> CelestialBodyModel {
    let mut model = CelestialBodyModel::new();
    model.register_body(&body("sol", None, 1.989e30, 6.96e8, 0.0)).unwrap();
    model.register_body(&planet()).unwrap();
    model
        .register_body(&body("moon", Some("planet"), 7.342e22, 1.7374e6, 3.844e8))
        .unwrap();
    model.link_hierarchy().unwrap();
    model
}

/// Star with two planets, linked but not yet initialized.
pub(crate) fn sibling_system() -> CelestialBodyModel {
    let mut model = CelestialBodyModel::new();
    model.register_body(&body("sol", None, 1.989e30, 6.96e8, 0.0)).unwrap();
    model.register_body(&planet()).unwrap();
    model
        .register_body(&body("mars", Some("sol"), 6.42e23, 3.3895e6, 2.279e11))
        .unwrap();
    model.link_hierarchy().unwrap();
    model
}

/// In-memory host: flat ground at one height everywhere, or none at all.
#[derive(Debug, Default)]
pub(crate) struct MockHost {
    pub dimensions: HashMap<String, DimensionData>,
    pub manifests: HashMap<VehicleHandle, Vec<CapturedBlock>>,
    pub ground: Option<i32>,
    pub air_resistance: f64,
    pub placed: Vec<(String, IVec3, Vec<CapturedBlock>, u8)>,
    pub explosions: Vec<(DVec3, f64)>,
    pub published: Vec<(VehicleHandle, TelemetrySnapshot)>,
}

impl MockHost {
    /// Surface and orbit dimensions for the planet and moon of
    /// [`three_body_chain`].
    pub fn for_chain(model: &CelestialBodyModel) -> Self {
        let planet = model.handle_of("planet").unwrap();
        let moon = model.handle_of("moon").unwrap();
        let data = |body, is_orbit, pressure| DimensionData {
            body,
            is_orbit,
            pressure,
        };
        let dimensions = [
            ("overworld", data(planet, false, 1.0)),
            ("planet_orbit", data(planet, true, 0.0)),
            ("moon", data(moon, false, 0.0)),
            ("moon_orbit", data(moon, true, 0.0)),
        ]
        .into_iter()
        .map(|(name, data)| (name.to_string(), data))
        .collect();
        MockHost {
            dimensions,
            ..MockHost::default()
        }
    }
}

impl EnvironmentProvider for MockHost {
    fn environment(&self, dimension: &str) -> Option<DimensionData> {
        self.dimensions.get(dimension).copied()
    }
}

impl BlockManifestProvider for MockHost {
    fn blocks(&self, vehicle: VehicleHandle) -> Result<Vec<CapturedBlock>, SimulationError> {
        self.manifests
            .get(&vehicle)
            .cloned()
            .ok_or_else(|| SimulationError::NotFound(format!("vehicle {}", vehicle.0)))
    }

    fn place_blocks(
        &mut self,
        _vehicle: VehicleHandle,
        dimension: &str,
        origin: IVec3,
        blocks: &[CapturedBlock],
        rotation_steps: u8,
    ) -> Result<(), SimulationError> {
        self.placed
            .push((dimension.to_string(), origin, blocks.to_vec(), rotation_steps));
        Ok(())
    }
}

impl WorldProbe for MockHost {
    fn move_bounds(&mut self, _dimension: &str, bounds: Aabb, displacement: DVec3) -> MoveOutcome {
        match self.ground {
            Some(ground) if bounds.min.y + displacement.y < f64::from(ground) => MoveOutcome {
                displacement: DVec3::new(
                    displacement.x,
                    f64::from(ground) - bounds.min.y,
                    displacement.z,
                ),
                vertical_collision: true,
                horizontal_collision: false,
            },
            _ => MoveOutcome::unobstructed(displacement),
        }
    }

    fn solid_ground_below(&self, _dimension: &str, _x: i32, _z: i32) -> Option<i32> {
        self.ground
    }

    fn air_resistance_multiplier(&self, _dimension: &str, _position: DVec3) -> f64 {
        self.air_resistance
    }

    fn explode(&mut self, _dimension: &str, at: DVec3, power: f64) {
        self.explosions.push((at, power));
    }
}

impl TelemetrySink for MockHost {
    fn publish(&mut self, vehicle: VehicleHandle, snapshot: &TelemetrySnapshot) {
        self.published.push((vehicle, *snapshot));
    }
}
