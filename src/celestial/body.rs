use std::f64::consts::TAU;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::config::{AtmosphereConfig, BodyConfig, OrbitConfig, RotationConfig};
use crate::constants::{
    AEROBRAKING_MIN_PRESSURE, ASCENT_DRAG_COEFFICIENT, ASCENT_DRAG_EXPONENT,
    ASCENT_GRAVITY_LOSS_FACTOR, ASTRONOMICAL_UNIT, EARTH_MASS, EARTH_RADIUS,
    GRAVITATIONAL_CONSTANT, LANDING_MARGIN_DV,
};
use crate::errors::{ensure_finite, SimulationError};
use crate::persistence::BodyRecord;
use crate::utils::vector_math::{rotate_about_axis, rotate_x, rotate_y, wrap_angle};

/// Stable index of a body inside its [`CelestialBodyModel`](super::system::CelestialBodyModel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(pub(crate) usize);

impl BodyHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureCategory {
    ExtraCold,
    Cold,
    #[default]
    Temperate,
    Hot,
    ExtraHot,
}

/// One gravitating body: a star, planet, moon or sub-satellite.
#[derive(Clone, Debug)]
pub struct CelestialBody {
    name: String,
    dimension: Option<String>,
    pub(crate) parent_name: Option<String>,
    pub(crate) parent: Option<BodyHandle>,
    pub(crate) satellites: Vec<BodyHandle>,
    pub(crate) satellite_level: u32,
    mass: f64,
    radius: f64,
    parking_orbit_radius: f64,
    surface_gravity: f64,
    parking_orbit_angular_speed: f64,
    orbit: OrbitConfig,
    rotation_elements: RotationConfig,
    atmosphere: AtmosphereConfig,
    pub(crate) position: DVec3,
    pub(crate) velocity: DVec3,
    pub(crate) acceleration: DVec3,
    pub(crate) rotation: f64,
    pub(crate) precession: f64,
    pub(crate) parking_orbit_angle: f64,
    surface_viewpoint: DVec3,
    parking_orbit_viewpoint: DVec3,
}

impl PartialEq for CelestialBody {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl CelestialBody {
    pub fn new(config: &BodyConfig) -> Result<Self, SimulationError> {
        let invalid = |what: &str| {
            SimulationError::ConfigError(format!("body '{}': {what}", config.name))
        };

        if config.name.is_empty() {
            return Err(SimulationError::ConfigError(
                "body name must not be empty".to_string(),
            ));
        }
        if !(config.mass.is_finite() && config.mass > 0.0) {
            return Err(invalid("mass must be positive"));
        }
        if !(config.radius.is_finite() && config.radius > 0.0) {
            return Err(invalid("radius must be positive"));
        }
        if !(config.parking_orbit_altitude.is_finite() && config.parking_orbit_altitude >= 0.0) {
            return Err(invalid("parking orbit altitude must be non-negative"));
        }
        if !(config.atmosphere.surface_pressure.is_finite()
            && config.atmosphere.surface_pressure >= 0.0)
        {
            return Err(invalid("surface pressure must be non-negative"));
        }

        let mass = config.mass;
        let radius = config.radius;
        let parking_orbit_radius = radius + config.parking_orbit_altitude;
        let earth_gravity = GRAVITATIONAL_CONSTANT * EARTH_MASS / (EARTH_RADIUS * EARTH_RADIUS);
        let surface_gravity = (GRAVITATIONAL_CONSTANT * mass / (radius * radius)) / earth_gravity;
        let parking_orbit_angular_speed =
            (GRAVITATIONAL_CONSTANT * mass / parking_orbit_radius.powi(3)).sqrt();

        Ok(CelestialBody {
            name: config.name.clone(),
            dimension: config.dimension.clone(),
            parent_name: config.parent.clone(),
            parent: None,
            satellites: Vec::new(),
            satellite_level: 0,
            mass,
            radius,
            parking_orbit_radius,
            surface_gravity,
            parking_orbit_angular_speed,
            orbit: config.orbit,
            rotation_elements: config.rotation,
            atmosphere: config.atmosphere,
            position: DVec3::ZERO,
            velocity: DVec3::ZERO,
            acceleration: DVec3::ZERO,
            rotation: 0.0,
            precession: 0.0,
            parking_orbit_angle: 0.0,
            surface_viewpoint: DVec3::ZERO,
            parking_orbit_viewpoint: DVec3::ZERO,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dimension used as this body's surface.
    pub fn dimension(&self) -> Option<&str> {
        self.dimension.as_deref()
    }

    pub fn parent(&self) -> Option<BodyHandle> {
        self.parent
    }

    pub fn satellites(&self) -> &[BodyHandle] {
        &self.satellites
    }

    /// 0 = star, 1 = planet, 2 = moon, 3 = sub-satellite...
    pub fn satellite_level(&self) -> u32 {
        self.satellite_level
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn parking_orbit_radius(&self) -> f64 {
        self.parking_orbit_radius
    }

    /// Surface gravity as a multiple of Earth's.
    pub fn surface_gravity(&self) -> f64 {
        self.surface_gravity
    }

    pub fn parking_orbit_angular_speed(&self) -> f64 {
        self.parking_orbit_angular_speed
    }

    pub fn orbit(&self) -> &OrbitConfig {
        &self.orbit
    }

    pub fn rotation_elements(&self) -> &RotationConfig {
        &self.rotation_elements
    }

    pub fn atmosphere(&self) -> &AtmosphereConfig {
        &self.atmosphere
    }

    /// Surface pressure in multiples of Earth sea-level pressure.
    pub fn surface_pressure(&self) -> f64 {
        self.atmosphere.surface_pressure
    }

    pub fn position(&self) -> DVec3 {
        self.position
    }

    /// Velocity relative to the parent body.
    pub fn velocity(&self) -> DVec3 {
        self.velocity
    }

    pub fn acceleration(&self) -> DVec3 {
        self.acceleration
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn precession(&self) -> f64 {
        self.precession
    }

    pub fn parking_orbit_angle(&self) -> f64 {
        self.parking_orbit_angle
    }

    pub fn surface_viewpoint(&self) -> DVec3 {
        self.surface_viewpoint
    }

    pub fn parking_orbit_viewpoint(&self) -> DVec3 {
        self.parking_orbit_viewpoint
    }

    pub fn semi_major_axis(&self) -> f64 {
        (self.orbit.periapsis + self.orbit.apoapsis) / 2.0
    }

    pub fn eccentricity(&self) -> f64 {
        let sum = self.orbit.apoapsis + self.orbit.periapsis;
        if sum == 0.0 {
            0.0
        } else {
            (self.orbit.apoapsis - self.orbit.periapsis) / sum
        }
    }

    /// Orbital radius at true anomaly `ta` from the conic equation.
    pub fn orbital_radius_at(&self, ta: f64) -> f64 {
        let ecc = self.eccentricity();
        self.semi_major_axis() * (1.0 - ecc * ecc) / (1.0 + ecc * ta.cos())
    }

    /// Position relative to the parent at true anomaly `ta`.
    pub fn relative_position_at_true_anomaly(&self, ta: f64) -> DVec3 {
        let r = self.orbital_radius_at(ta);
        let node_axis = rotate_y(DVec3::X, self.orbit.ascending_node);
        let in_plane = rotate_y(node_axis, self.orbit.argument_of_periapsis + ta);
        rotate_about_axis(in_plane, node_axis, self.orbit.inclination) * r
    }

    pub fn circular_orbit_velocity(&self, r: f64) -> f64 {
        (GRAVITATIONAL_CONSTANT * self.mass / r).sqrt()
    }

    pub fn escape_velocity(&self, r: f64) -> f64 {
        (2.0 * GRAVITATIONAL_CONSTANT * self.mass / r).sqrt()
    }

    /// Hohmann transfer cost between circular orbits of radius `r1` and `r2`
    /// around this body. `esc1` and `esc2` are the hyperbolic excess speeds
    /// carried into the departure and arrival burns.
    pub fn hohmann_transfer_dv(
        &self,
        r1: f64,
        r2: f64,
        esc1: f64,
        esc2: f64,
    ) -> Result<f64, SimulationError> {
        if !(r1 > 0.0 && r2 > 0.0) {
            return Err(SimulationError::ArithmeticDomainError(format!(
                "transfer radii around '{}' must be positive (r1 = {r1}, r2 = {r2})",
                self.name
            )));
        }
        let gm = GRAVITATIONAL_CONSTANT * self.mass;
        let inverse_sma = 2.0 / (r1 + r2);
        let vc1 = (gm / r1).sqrt();
        let vc2 = (gm / r2).sqrt();
        let ve1 = (gm * ((2.0 / r1) - inverse_sma)).sqrt();
        let ve2 = (gm * ((2.0 / r2) - inverse_sma)).sqrt();
        let dv1 = ((ve1 - vc1).powi(2) + esc1.powi(2)).sqrt() - esc1;
        let dv2 = ((ve2 - vc2).powi(2) + esc2.powi(2)).sqrt() - esc2;
        ensure_finite(dv1 + dv2, "Hohmann transfer delta-v")
    }

    /// Cost of reaching the parking orbit from the surface, including an
    /// empirical atmospheric drag penalty.
    pub fn surface_to_orbit_dv(&self) -> f64 {
        self.circular_orbit_velocity(self.parking_orbit_radius) * ASCENT_GRAVITY_LOSS_FACTOR
            + ASCENT_DRAG_COEFFICIENT * self.surface_pressure().powf(ASCENT_DRAG_EXPONENT)
    }

    /// Cost of landing from the parking orbit. Without an atmosphere to brake
    /// against, landing costs as much as the ascent.
    pub fn orbit_to_surface_dv(&self) -> f64 {
        if self.surface_pressure() < AEROBRAKING_MIN_PRESSURE {
            self.surface_to_orbit_dv()
        } else {
            LANDING_MARGIN_DV
        }
    }

    /// Temperature category seen at the given sky angle (0..1, 0.5 = midnight).
    pub fn temperature_category(&self, sky_angle: f32, in_orbit: bool) -> TemperatureCategory {
        let base = self.atmosphere.temperature;
        if base >= TemperatureCategory::Temperate && (in_orbit || self.surface_pressure() < 0.01) {
            if !(0.25..=0.75).contains(&sky_angle) {
                TemperatureCategory::Hot
            } else {
                TemperatureCategory::Cold
            }
        } else {
            base
        }
    }

    /// Solar power multiplier from distance to the star and cloud cover.
    pub fn solar_multiplier(&self) -> f64 {
        let distance = self.position.length();
        if distance == 0.0 {
            return 0.0;
        }
        let au = distance / ASTRONOMICAL_UNIT;
        let clouds = if self.atmosphere.has_cloud_cover { 0.5 } else { 1.0 };
        clouds / (au * au)
    }

    /// Angle between the chosen viewpoint and the star around this body, used
    /// as the local time of day.
    pub fn sun_angle_xz(&self, from_orbit: bool) -> f64 {
        let viewpoint = if from_orbit {
            self.parking_orbit_viewpoint
        } else {
            self.surface_viewpoint
        };
        let azimuth_of_viewpoint =
            (viewpoint.z - self.position.z).atan2(viewpoint.x - self.position.x);
        let azimuth_of_star = (-self.position.z).atan2(-self.position.x);
        let mut true_azimuth = azimuth_of_star - azimuth_of_viewpoint;

        if true_azimuth < 0.0 {
            true_azimuth += TAU;
        } else if true_azimuth > TAU {
            true_azimuth -= TAU;
        }
        true_azimuth
    }

    /// Spins the body and its parking-orbit reference point by one step.
    /// All three angles decrease with positive rates and wrap into [0, 2π).
    pub(crate) fn advance_rotation(&mut self, dt: f64) {
        self.rotation = wrap_angle(self.rotation - self.rotation_elements.rotation_rate * dt);
        self.precession = wrap_angle(self.precession - self.rotation_elements.precession_rate * dt);
        self.parking_orbit_angle =
            wrap_angle(self.parking_orbit_angle - self.parking_orbit_angular_speed * dt);
    }

    /// Recomputes the surface and parking-orbit viewpoints from rotation state.
    pub(crate) fn update_viewpoints(&mut self, parent_position: Option<DVec3>) {
        let axis = rotate_y(
            rotate_x(DVec3::Y, self.rotation_elements.obliquity),
            self.precession,
        );
        self.surface_viewpoint =
            self.position + rotate_about_axis(DVec3::X, axis, self.rotation) * self.radius;
        self.parking_orbit_viewpoint = self.position
            + rotate_about_axis(DVec3::X, axis, self.parking_orbit_angle)
                * self.parking_orbit_radius;

        if self.rotation_elements.tidally_locked {
            if let Some(parent_position) = parent_position {
                let outward = (self.position - parent_position).normalize_or_zero();
                self.surface_viewpoint = self.position - outward * self.radius;
            }
        }
    }

    pub fn to_record(&self) -> BodyRecord {
        BodyRecord {
            position: self.position,
            velocity: self.velocity,
            rotation: self.rotation,
            precession: self.precession,
            parking_orbit_angle: self.parking_orbit_angle,
        }
    }

    pub(crate) fn apply_record(&mut self, record: &BodyRecord) -> Result<(), SimulationError> {
        let finite = record.position.is_finite()
            && record.velocity.is_finite()
            && record.rotation.is_finite()
            && record.precession.is_finite()
            && record.parking_orbit_angle.is_finite();
        if !finite {
            return Err(SimulationError::ArithmeticDomainError(format!(
                "persisted state of '{}' is not finite",
                self.name
            )));
        }
        self.position = record.position;
        self.velocity = record.velocity;
        self.rotation = wrap_angle(record.rotation);
        self.precession = wrap_angle(record.precession);
        self.parking_orbit_angle = wrap_angle(record.parking_orbit_angle);
        Ok(())
    }
}
