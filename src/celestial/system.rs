//! Registry and propagator for a set of celestial body trees.

use std::collections::{BTreeMap, HashMap};

use glam::DVec3;
use tracing::{debug, info};

use crate::celestial::body::{BodyHandle, CelestialBody};
use crate::config::{BodyConfig, SystemConfig};
use crate::constants::{GRAVITATIONAL_CONSTANT, TANGENT_STEP};
use crate::errors::{ensure_finite, SimulationError};
use crate::persistence::BodyRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum ModelStage {
    Registering,
    Linked,
    Initialized,
}

/// Owns every body of every star system and advances them once per tick.
///
/// Setup is two-phase: [`register_body`](Self::register_body) for each body,
/// then [`link_hierarchy`](Self::link_hierarchy) once. After that either
/// [`initialize_orbits`](Self::initialize_orbits) or
/// [`load_state`](Self::load_state) must run before the first
/// [`tick`](Self::tick).
#[derive(Debug, Clone)]
pub struct CelestialBodyModel {
    bodies: Vec<CelestialBody>,
    index: HashMap<String, BodyHandle>,
    // parent-before-child traversal order, fixed at link time
    order: Vec<BodyHandle>,
    stage: ModelStage,
}

impl Default for CelestialBodyModel {
    fn default() -> Self {
        Self::new()
    }
}

impl CelestialBodyModel {
    pub fn new() -> Self {
        CelestialBodyModel {
            bodies: Vec::new(),
            index: HashMap::new(),
            order: Vec::new(),
            stage: ModelStage::Registering,
        }
    }

    /// Registers and links every body of a parsed star-system manifest.
    pub fn from_config(config: &SystemConfig) -> Result<Self, SimulationError> {
        let mut model = Self::new();
        for body in &config.bodies {
            model.register_body(body)?;
        }
        model.link_hierarchy()?;
        Ok(model)
    }

    pub fn register_body(&mut self, config: &BodyConfig) -> Result<BodyHandle, SimulationError> {
        if self.stage != ModelStage::Registering {
            return Err(SimulationError::PreconditionViolation(format!(
                "cannot register '{}' after the hierarchy has been linked",
                config.name
            )));
        }
        if self.index.contains_key(&config.name) {
            return Err(SimulationError::ConfigError(format!(
                "body '{}' is already registered",
                config.name
            )));
        }

        let body = CelestialBody::new(config)?;
        let handle = BodyHandle(self.bodies.len());
        self.index.insert(config.name.clone(), handle);
        self.bodies.push(body);
        Ok(handle)
    }

    /// Resolves every parent by name, builds satellite lists in registration
    /// order, assigns satellite levels and rejects cycles.
    pub fn link_hierarchy(&mut self) -> Result<(), SimulationError> {
        if self.stage != ModelStage::Registering {
            return Err(SimulationError::PreconditionViolation(
                "hierarchy is already linked".to_string(),
            ));
        }

        let mut parents = Vec::with_capacity(self.bodies.len());
        for body in &self.bodies {
            let parent = match &body.parent_name {
                Some(parent_name) => Some(*self.index.get(parent_name).ok_or_else(|| {
                    SimulationError::ConfigError(format!(
                        "body '{}' orbits unknown parent '{parent_name}'",
                        body.name()
                    ))
                })?),
                None => None,
            };
            parents.push(parent);
        }

        // A chain longer than the body count must revisit a body.
        for (start, _) in parents.iter().enumerate() {
            let mut cursor = parents[start];
            let mut steps = 0;
            while let Some(handle) = cursor {
                steps += 1;
                if handle.0 == start || steps > parents.len() {
                    return Err(SimulationError::ConfigError(format!(
                        "orbital hierarchy through '{}' contains a cycle",
                        self.bodies[start].name()
                    )));
                }
                cursor = parents[handle.0];
            }
        }

        for (i, parent) in parents.iter().enumerate() {
            if let Some(parent) = parent {
                let orbit = self.bodies[i].orbit();
                if !(orbit.periapsis > 0.0 && orbit.apoapsis >= orbit.periapsis) {
                    return Err(SimulationError::ConfigError(format!(
                        "body '{}' needs 0 < periapsis <= apoapsis",
                        self.bodies[i].name()
                    )));
                }
                self.bodies[parent.0].satellites.push(BodyHandle(i));
            }
            self.bodies[i].parent = *parent;
        }

        let mut order = Vec::with_capacity(self.bodies.len());
        let mut stack: Vec<(BodyHandle, u32)> = parents
            .iter()
            .enumerate()
            .filter(|(_, parent)| parent.is_none())
            .map(|(i, _)| (BodyHandle(i), 0))
            .rev()
            .collect();
        while let Some((handle, level)) = stack.pop() {
            self.bodies[handle.0].satellite_level = level;
            order.push(handle);
            for satellite in self.bodies[handle.0].satellites.iter().rev() {
                stack.push((*satellite, level + 1));
            }
        }
        debug_assert_eq!(order.len(), self.bodies.len());

        self.order = order;
        self.stage = ModelStage::Linked;
        info!(
            bodies = self.bodies.len(),
            systems = self.roots().count(),
            "Linked celestial hierarchy"
        );
        Ok(())
    }

    /// Places every satellite on its configured Keplerian orbit around its
    /// already-placed parent, walking each tree root to leaf.
    pub fn initialize_orbits(&mut self) -> Result<(), SimulationError> {
        self.require_stage(ModelStage::Linked, "initialize orbits")?;

        for i in 0..self.order.len() {
            let handle = self.order[i];
            let body = &self.bodies[handle.0];
            let Some(parent) = body.parent else {
                let body = &mut self.bodies[handle.0];
                body.position = DVec3::ZERO;
                body.velocity = DVec3::ZERO;
                body.acceleration = DVec3::ZERO;
                body.update_viewpoints(None);
                continue;
            };

            let parent_position = self.bodies[parent.0].position;
            let parent_mass = self.bodies[parent.0].mass();
            let ta = body.orbit().true_anomaly;
            let relative_position = body.relative_position_at_true_anomaly(ta);
            let relative_step = body.relative_position_at_true_anomaly(ta - TANGENT_STEP);
            let tangent = (relative_step - relative_position).normalize_or_zero();
            let speed = (GRAVITATIONAL_CONSTANT
                * parent_mass
                * ((2.0 / relative_position.length()) - (1.0 / body.semi_major_axis())))
            .sqrt();
            let speed = ensure_finite(speed, "initial orbital speed")?;

            let body = &mut self.bodies[handle.0];
            body.position = parent_position + relative_position;
            body.velocity = tangent * speed;
            body.acceleration = DVec3::ZERO;
            body.update_viewpoints(Some(parent_position));
            debug!(body = body.name(), speed, "Placed body on initial orbit");
        }

        self.stage = ModelStage::Initialized;
        info!(bodies = self.bodies.len(), "Initialized orbits");
        Ok(())
    }

    /// Advances every body by `dt` seconds.
    ///
    /// Only the direct parent's gravity acts on a body. Velocities are kept
    /// relative to the parent, and positions move with the whole ancestor
    /// chain's velocity: a co-moving approximation, not an inertial n-body
    /// integrator.
    pub fn tick(&mut self, dt: f64) -> Result<(), SimulationError> {
        self.require_stage(ModelStage::Initialized, "tick")?;
        if !(dt.is_finite() && dt >= 0.0) {
            return Err(SimulationError::PreconditionViolation(format!(
                "time step must be finite and non-negative, got {dt}"
            )));
        }

        let mut accelerations = Vec::with_capacity(self.bodies.len());
        for body in &self.bodies {
            let acceleration = match body.parent {
                Some(parent) => {
                    let parent = &self.bodies[parent.0];
                    let offset = parent.position - body.position;
                    let squared_distance = offset.length_squared();
                    if squared_distance == 0.0 {
                        return Err(SimulationError::ArithmeticDomainError(format!(
                            "body '{}' coincides with its parent",
                            body.name()
                        )));
                    }
                    offset.normalize()
                        * (GRAVITATIONAL_CONSTANT * parent.mass() / squared_distance)
                }
                None => DVec3::ZERO,
            };
            accelerations.push(acceleration);
        }

        for (body, acceleration) in self.bodies.iter_mut().zip(accelerations) {
            if body.parent.is_some() {
                body.acceleration = acceleration;
                body.velocity += acceleration * dt;
            }
        }

        for i in 0..self.order.len() {
            let handle = self.order[i];
            let parent = self.bodies[handle.0].parent;

            if parent.is_some() {
                let mut displacement = self.bodies[handle.0].velocity * dt;
                let mut ancestor = parent;
                while let Some(a) = ancestor {
                    displacement += self.bodies[a.0].velocity * dt;
                    ancestor = self.bodies[a.0].parent;
                }
                self.bodies[handle.0].position += displacement;
            }

            let parent_position = parent.map(|p| self.bodies[p.0].position);
            let body = &mut self.bodies[handle.0];
            body.advance_rotation(dt);
            body.update_viewpoints(parent_position);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn is_linked(&self) -> bool {
        self.stage >= ModelStage::Linked
    }

    pub fn is_initialized(&self) -> bool {
        self.stage == ModelStage::Initialized
    }

    pub fn get(&self, handle: BodyHandle) -> Result<&CelestialBody, SimulationError> {
        self.bodies
            .get(handle.0)
            .ok_or_else(|| SimulationError::NotFound(format!("body handle {}", handle.0)))
    }

    pub fn handle_of(&self, name: &str) -> Result<BodyHandle, SimulationError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| SimulationError::NotFound(format!("body '{name}'")))
    }

    pub fn by_name(&self, name: &str) -> Result<&CelestialBody, SimulationError> {
        self.get(self.handle_of(name)?)
    }

    /// Body whose surface is the given dimension.
    pub fn body_for_dimension(&self, dimension: &str) -> Option<BodyHandle> {
        self.bodies
            .iter()
            .position(|body| body.dimension() == Some(dimension))
            .map(BodyHandle)
    }

    pub fn parent_of(&self, handle: BodyHandle) -> Result<Option<BodyHandle>, SimulationError> {
        Ok(self.get(handle)?.parent())
    }

    pub fn satellites_of(&self, handle: BodyHandle) -> Result<&[BodyHandle], SimulationError> {
        Ok(self.get(handle)?.satellites())
    }

    pub fn roots(&self) -> impl Iterator<Item = BodyHandle> + '_ {
        self.bodies
            .iter()
            .enumerate()
            .filter(|(_, body)| body.parent.is_none())
            .map(|(i, _)| BodyHandle(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, &CelestialBody)> {
        self.bodies
            .iter()
            .enumerate()
            .map(|(i, body)| (BodyHandle(i), body))
    }

    pub fn save_state(&self) -> BTreeMap<String, BodyRecord> {
        self.bodies
            .iter()
            .map(|body| (body.name().to_string(), body.to_record()))
            .collect()
    }

    /// Restores persisted state. Records for unknown bodies are ignored and
    /// bodies without a record keep their current state.
    pub fn load_state(
        &mut self,
        records: &BTreeMap<String, BodyRecord>,
    ) -> Result<(), SimulationError> {
        self.require_stage(ModelStage::Linked, "load state")?;

        for i in 0..self.order.len() {
            let handle = self.order[i];
            let Some(record) = records.get(self.bodies[handle.0].name()) else {
                continue;
            };
            self.bodies[handle.0].apply_record(record)?;
            let parent_position = self.bodies[handle.0]
                .parent
                .map(|p| self.bodies[p.0].position);
            self.bodies[handle.0].update_viewpoints(parent_position);
        }

        self.stage = ModelStage::Initialized;
        info!(records = records.len(), "Loaded celestial state");
        Ok(())
    }

    fn require_stage(&self, stage: ModelStage, action: &str) -> Result<(), SimulationError> {
        if self.stage < stage {
            Err(SimulationError::PreconditionViolation(format!(
                "cannot {action}: celestial model is {:?}, needs {:?}",
                self.stage, stage
            )))
        } else {
            Ok(())
        }
    }
}
