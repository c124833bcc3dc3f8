use std::f64::consts::FRAC_PI_2;

use glam::{DQuat, DVec3, IVec3};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::celestial::system::CelestialBodyModel;
use crate::config::FlightConfig;
use crate::control::assembly::{rotation_steps, CapturedBlock, FlyingAssembly};
use crate::control::environment::Environment;
use crate::control::fuel_management::PropellantTanks;
use crate::control::guidance::{landing_throttle, launch_throttle};
use crate::control::host::{BlockManifestProvider, EnvironmentProvider, FlightHost, VehicleHandle};
use crate::control::mission::{ArrivalSite, FlightPlan};
use crate::control::pilot::{apply_throttle_command, Cardinal, ControlInput, RotationRates};
use crate::control::propulsion::PropulsionSystem;
use crate::errors::{ensure_finite, SimulationError};
use crate::persistence::VehicleRecord;
use crate::telemetry_system::telemetry::TelemetrySnapshot;
use crate::trajectory_system::kinematics::{Kinematics, MoveOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightPhase {
    Assembled,
    Launching,
    Cruising,
    Transferring,
    Descending,
    /// Terminal: the blocks are back in the world.
    Landed,
}

impl FlightPhase {
    pub fn is_terminal(self) -> bool {
        self == FlightPhase::Landed
    }
}

/// A flying craft: captured blocks plus the rocket flight model.
#[derive(Debug, Clone)]
pub struct Rocket {
    handle: VehicleHandle,
    dimension: String,
    destination: String,
    fuel_to_use: f64,
    arrival: ArrivalSite,
    assembly: FlyingAssembly,
    kinematics: Kinematics,
    propulsion: PropulsionSystem,
    tanks: PropellantTanks,
    throttle: f64,
    rates: RotationRates,
    input: ControlInput,
    user_input: bool,
    changed_dimension: bool,
    craft_mass: f64,
    craft_mass_initial: f64,
    environment: Environment,
    phase: FlightPhase,
    age: u32,
    config: FlightConfig,
    rng: StdRng,
    telemetry: Option<TelemetrySnapshot>,
}

impl Rocket {
    /// Captures the vehicle's blocks and prepares it for launch from
    /// `dimension` towards the plan's destination.
    pub fn assemble<H>(
        handle: VehicleHandle,
        host: &H,
        bodies: &CelestialBodyModel,
        dimension: &str,
        plan: &FlightPlan,
        forward: Cardinal,
        config: FlightConfig,
    ) -> Result<Self, SimulationError>
    where
        H: BlockManifestProvider + EnvironmentProvider,
    {
        let capture = FlyingAssembly::capture(host.blocks(handle)?, forward)?;

        let origin = host.environment(dimension);
        let destination = host
            .environment(&plan.destination)
            .ok_or_else(|| SimulationError::NotFound(format!("dimension '{}'", plan.destination)))?;
        let start_pressure = origin.map_or(1.0, |data| data.effective_pressure());
        let propulsion = PropulsionSystem::from_thrusters(
            capture.assembly.thrusters(),
            start_pressure,
            destination.effective_pressure(),
        )?;
        let environment = Environment::resolve(origin.as_ref(), bodies)?;

        let arrival = plan.arrival.unwrap_or(ArrivalSite {
            x: capture.center_block.x,
            y: None,
            z: capture.center_block.z,
            direction: forward.opposite(),
        });

        info!(
            vehicle = handle.0,
            mass = capture.mass,
            thrust = propulsion.nominal_thrust_start,
            from = dimension,
            to = %plan.destination,
            "Assembled rocket"
        );

        Ok(Rocket {
            handle,
            dimension: dimension.to_string(),
            destination: plan.destination.clone(),
            fuel_to_use: plan.fuel_to_use,
            arrival,
            tanks: capture.assembly.tanks(),
            kinematics: Kinematics::new(capture.spawn_position()),
            assembly: capture.assembly,
            propulsion,
            throttle: 0.0,
            rates: RotationRates::default(),
            input: ControlInput::default(),
            user_input: false,
            changed_dimension: false,
            craft_mass: capture.mass,
            craft_mass_initial: capture.mass,
            environment,
            phase: FlightPhase::Assembled,
            age: 0,
            config,
            rng: StdRng::seed_from_u64(handle.0),
            telemetry: None,
        })
    }

    /// Stores a pilot command frame. Manual control takes over once any
    /// command is given, but only under gravity.
    pub fn receive_input(&mut self, input: ControlInput) {
        self.input = input;
        if !input.is_neutral() && self.environment.gravity > 0.0 {
            self.user_input = true;
        }
    }

    /// Advances the flight by one tick of `dt` seconds.
    pub fn tick<H: FlightHost>(
        &mut self,
        host: &mut H,
        bodies: &CelestialBodyModel,
        dt: f64,
    ) -> Result<FlightPhase, SimulationError> {
        if self.phase.is_terminal() {
            return Ok(self.phase);
        }
        if !(dt > 0.0 && dt.is_finite()) {
            return Err(SimulationError::PreconditionViolation(format!(
                "tick length must be positive, got {dt}"
            )));
        }

        self.age += 1;
        self.environment = Environment::resolve(host.environment(&self.dimension).as_ref(), bodies)?;
        if self.changed_dimension && self.arrival.y.is_none() {
            let ground = host
                .solid_ground_below(&self.dimension, self.arrival.x, self.arrival.z)
                .unwrap_or(self.config.fallback_landing_altitude);
            debug!(vehicle = self.handle.0, ground, "Probed landing altitude");
            self.arrival.y = Some(ground);
        }

        let mut burn_capped = false;
        if self.user_input {
            self.apply_user_input();
        } else if self.changed_dimension {
            self.landing_autopilot()?;
        } else {
            burn_capped = self.launch_autopilot()?;
        }

        self.kinematics.apply_gravity(self.environment.gravity, dt);
        self.apply_thrust(dt)?;

        let velocity = self.kinematics.velocity;
        let bounds = self.assembly.bounding_box(self.kinematics.position);
        let outcome = host.move_bounds(&self.dimension, bounds, velocity * dt);
        self.kinematics.apply_move(&outcome);

        let ceiling = self.config.ceiling(self.environment.in_orbit);
        if !self.changed_dimension && self.kinematics.position.y.floor() > ceiling {
            self.transfer(&*host)?;
            return Ok(self.phase);
        }

        if self.age > self.config.min_landing_age && self.is_settled(&outcome) {
            self.settle(host, &outcome, velocity)?;
        } else {
            // the autopilot cruises once clear of the pad and off full power
            let cruising = self.user_input
                || self.phase == FlightPhase::Cruising
                || (burn_capped && self.age > self.config.min_landing_age);
            self.set_phase(if self.changed_dimension {
                FlightPhase::Descending
            } else if cruising {
                FlightPhase::Cruising
            } else {
                FlightPhase::Launching
            });
        }

        self.publish_telemetry(host);
        Ok(self.phase)
    }

    fn set_phase(&mut self, phase: FlightPhase) {
        if phase != self.phase {
            debug!(vehicle = self.handle.0, from = ?self.phase, to = ?phase, "Flight phase changed");
            self.phase = phase;
        }
    }

    fn apply_user_input(&mut self) {
        self.throttle =
            apply_throttle_command(self.throttle, self.input.throttle, self.config.throttle_step);
        self.rates
            .update(&self.input, self.assembly.forward, &self.config);
        self.kinematics
            .rotate(self.rates.rotation_step(self.assembly.forward));
    }

    /// Returns whether the climb is held below full power.
    fn launch_autopilot(&mut self) -> Result<bool, SimulationError> {
        let command = launch_throttle(
            self.environment.gravity,
            self.propulsion.thrust(self.changed_dimension),
            self.craft_mass,
            self.kinematics.velocity.y,
            &self.config,
        )?;
        self.throttle = command.throttle;
        if let Some(speed) = command.hold_vertical_speed {
            self.kinematics.velocity = DVec3::new(0.0, speed, 0.0);
        }
        Ok(self.tanks.has_propellant()
            && (command.throttle < 1.0 || command.hold_vertical_speed.is_some()))
    }

    fn landing_autopilot(&mut self) -> Result<(), SimulationError> {
        let height = self.bottom_height() - f64::from(self.landing_altitude());
        let max_acceleration = self.propulsion.thrust(true) / self.craft_mass;
        self.throttle = landing_throttle(
            self.kinematics.velocity.y,
            height,
            self.environment.gravity,
            max_acceleration,
            self.throttle,
            &self.config,
        )?;
        Ok(())
    }

    /// Burns propellant for one tick and returns the mass spent.
    fn apply_thrust(&mut self, dt: f64) -> Result<f64, SimulationError> {
        if self.throttle == 0.0 || !self.tanks.has_propellant() {
            return Ok(0.0);
        }
        if !(self.craft_mass > 0.0) {
            return Err(SimulationError::ArithmeticDomainError(format!(
                "craft mass fell to {}",
                self.craft_mass
            )));
        }

        let force = self.propulsion.thrust(self.changed_dimension) * self.throttle;
        if force == 0.0 {
            return Ok(0.0);
        }
        let acceleration = ensure_finite(force / self.craft_mass, "thrust acceleration")?;
        let burned = self.propulsion.mass_flow(force, self.changed_dimension)? * dt;

        self.kinematics.apply_thrust(acceleration, dt);
        self.craft_mass -= burned;
        self.tanks.draw(burned);
        trace!(
            vehicle = self.handle.0,
            force,
            acceleration,
            burned,
            mass = self.craft_mass,
            "Thrust applied"
        );
        Ok(burned)
    }

    /// Leaves for the destination: the rest of the trip's propellant is
    /// burned at once and the craft appears above its arrival site.
    fn transfer<H: EnvironmentProvider>(&mut self, host: &H) -> Result<(), SimulationError> {
        let destination = host
            .environment(&self.destination)
            .ok_or_else(|| SimulationError::NotFound(format!("dimension '{}'", self.destination)))?;

        let used = self.craft_mass_initial - self.craft_mass;
        self.fuel_to_use = (self.fuel_to_use - used).max(0.0);
        let burned = self.fuel_to_use.min(self.tanks.usable_propellant().max(0.0));
        self.tanks.draw(burned);
        self.craft_mass -= burned;

        let speed = if destination.is_orbit {
            self.config.zero_g_speed
        } else {
            self.config.zero_g_speed / 2.0
        };
        self.kinematics.velocity = DVec3::new(0.0, -speed, 0.0);
        self.changed_dimension = true;
        self.user_input = false;

        let arrival_yaw = (self.arrival.direction.rotation_degrees()
            - self.assembly.forward.opposite().rotation_degrees())
        .to_radians();
        self.kinematics.orientation =
            (DQuat::from_rotation_y(arrival_yaw) * self.kinematics.orientation).normalize();
        self.kinematics.position = DVec3::new(
            f64::from(self.arrival.x) + 0.5,
            self.config.ceiling(destination.is_orbit),
            f64::from(self.arrival.z) + 0.5,
        );

        debug!(
            vehicle = self.handle.0,
            from = %self.dimension,
            to = %self.destination,
            burned,
            "Transferring to destination"
        );
        self.dimension = self.destination.clone();
        self.set_phase(FlightPhase::Transferring);
        Ok(())
    }

    fn is_settled(&self, outcome: &MoveOutcome) -> bool {
        if outcome.collided() {
            return true;
        }
        self.changed_dimension
            && self.environment.is_weightless()
            && (self.bottom_height().floor() <= f64::from(self.landing_altitude())
                || self.kinematics.velocity.y >= 0.0)
    }

    /// Ends the flight, with a crash if the craft hit something too fast.
    fn settle<H: FlightHost>(
        &mut self,
        host: &mut H,
        outcome: &MoveOutcome,
        velocity: DVec3,
    ) -> Result<(), SimulationError> {
        let speed = velocity.length();
        if outcome.collided() && speed > self.config.crash_speed_threshold {
            let bottom = self.kinematics.block_position()
                - IVec3::new(0, self.assembly.lower_height as i32, 0);
            let power = (speed / self.config.crash_power_divisor).min(self.config.max_explosion_power);
            host.explode(&self.dimension, bottom.as_dvec3() + DVec3::splat(0.5), power);

            // one block per 10 m/s, in the direction of travel
            let depth = (speed / 10.0).floor() as i32;
            let direction = if velocity.y > 0.0 { 1 } else { -1 };
            let offset = self.rng.gen_range(depth..=depth + 1) * direction;
            self.kinematics.position.y += f64::from(offset);
            warn!(vehicle = self.handle.0, speed, power, "Crash landing");
        }

        self.release(host)?;
        info!(
            vehicle = self.handle.0,
            dimension = %self.dimension,
            speed,
            "Rocket landed"
        );
        self.set_phase(FlightPhase::Landed);
        Ok(())
    }

    /// Puts the blocks back into the world, aligned to the nearest quarter
    /// turn: tanks and the controller first, the rest after.
    fn release<H: BlockManifestProvider>(&mut self, host: &mut H) -> Result<(), SimulationError> {
        let steps = rotation_steps(self.kinematics.orientation);
        self.kinematics.orientation = DQuat::from_rotation_y(f64::from(steps) * FRAC_PI_2);
        let origin = self.kinematics.block_position();
        let (first, last) = self.assembly.release_batches(&self.tanks);
        host.place_blocks(self.handle, &self.dimension, origin, &first, steps)?;
        host.place_blocks(self.handle, &self.dimension, origin, &last, steps)?;
        Ok(())
    }

    fn publish_telemetry<H: FlightHost>(&mut self, host: &mut H) {
        let position = self.kinematics.position;
        let mut ground = host
            .solid_ground_below(&self.dimension, position.x.floor() as i32, position.z.floor() as i32)
            .map_or(0.0, f64::from);
        if self.environment.is_weightless() {
            if let Some(arrival) = self.arrival.y {
                ground = ground.max(f64::from(arrival));
            }
        }

        let snapshot = TelemetrySnapshot {
            thrust_underexpanded: host.air_resistance_multiplier(&self.dimension, position)
                > self.config.underexpansion_threshold,
            user_input: self.user_input,
            throttle: self.throttle,
            altitude: self.bottom_height() - ground,
            velocity: self.kinematics.velocity,
            hydrogen_level: self.tanks.hydrogen_level(),
            oxygen_level: self.tanks.oxygen_level(),
            phase: self.phase,
        };
        host.publish(self.handle, &snapshot);
        self.telemetry = Some(snapshot);
    }

    fn bottom_height(&self) -> f64 {
        self.kinematics.position.y - self.assembly.lower_height
    }

    fn landing_altitude(&self) -> i32 {
        self.arrival
            .y
            .unwrap_or(self.config.fallback_landing_altitude)
    }

    pub fn handle(&self) -> VehicleHandle {
        self.handle
    }

    pub fn phase(&self) -> FlightPhase {
        self.phase
    }

    pub fn dimension(&self) -> &str {
        &self.dimension
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn kinematics(&self) -> &Kinematics {
        &self.kinematics
    }

    pub fn assembly(&self) -> &FlyingAssembly {
        &self.assembly
    }

    pub fn propulsion(&self) -> &PropulsionSystem {
        &self.propulsion
    }

    pub fn tanks(&self) -> &PropellantTanks {
        &self.tanks
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn arrival(&self) -> &ArrivalSite {
        &self.arrival
    }

    pub fn throttle(&self) -> f64 {
        self.throttle
    }

    pub fn rates(&self) -> &RotationRates {
        &self.rates
    }

    pub fn craft_mass(&self) -> f64 {
        self.craft_mass
    }

    pub fn craft_mass_initial(&self) -> f64 {
        self.craft_mass_initial
    }

    pub fn fuel_to_use(&self) -> f64 {
        self.fuel_to_use
    }

    pub fn is_user_controlled(&self) -> bool {
        self.user_input
    }

    pub fn has_changed_dimension(&self) -> bool {
        self.changed_dimension
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    /// Last published snapshot.
    pub fn telemetry(&self) -> Option<&TelemetrySnapshot> {
        self.telemetry.as_ref()
    }

    pub fn to_record(&self) -> VehicleRecord {
        VehicleRecord {
            handle: self.handle,
            dimension: self.dimension.clone(),
            destination: self.destination.clone(),
            fuel_to_use: self.fuel_to_use,
            arrival: self.arrival,
            forward: self.assembly.forward,
            lower_height: self.assembly.lower_height,
            upper_height: self.assembly.upper_height,
            max_width: self.assembly.max_width,
            position: self.kinematics.position,
            velocity: self.kinematics.velocity,
            orientation: self.kinematics.orientation,
            throttle: self.throttle,
            rates: self.rates,
            input: self.input,
            user_input: self.user_input,
            changed_dimension: self.changed_dimension,
            craft_mass: self.craft_mass,
            craft_mass_initial: self.craft_mass_initial,
            tanks: self.tanks,
            propulsion: self.propulsion,
            environment: self.environment,
            phase: self.phase,
            age: self.age,
        }
    }

    /// Rebuilds a rocket from its record and its blocks, whose positions
    /// are already relative to the center block.
    pub fn from_record(
        record: VehicleRecord,
        blocks: Vec<CapturedBlock>,
        config: FlightConfig,
    ) -> Result<Self, SimulationError> {
        let finite = record.position.is_finite()
            && record.velocity.is_finite()
            && record.orientation.is_finite()
            && record.craft_mass.is_finite()
            && record.fuel_to_use.is_finite();
        if !finite || !(record.craft_mass > 0.0) {
            return Err(SimulationError::ArithmeticDomainError(format!(
                "persisted state of vehicle {} is not usable",
                record.handle.0
            )));
        }

        Ok(Rocket {
            handle: record.handle,
            dimension: record.dimension,
            destination: record.destination,
            fuel_to_use: record.fuel_to_use,
            arrival: record.arrival,
            assembly: FlyingAssembly {
                blocks,
                forward: record.forward,
                lower_height: record.lower_height,
                upper_height: record.upper_height,
                max_width: record.max_width,
            },
            kinematics: Kinematics {
                position: record.position,
                velocity: record.velocity,
                orientation: record.orientation,
            },
            propulsion: record.propulsion,
            tanks: record.tanks,
            throttle: record.throttle,
            rates: record.rates,
            input: record.input,
            user_input: record.user_input,
            changed_dimension: record.changed_dimension,
            craft_mass: record.craft_mass,
            craft_mass_initial: record.craft_mass_initial,
            environment: record.environment,
            phase: record.phase,
            age: record.age,
            config,
            rng: StdRng::seed_from_u64(record.handle.0),
            telemetry: None,
        })
    }
}
