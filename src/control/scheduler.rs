//! Fixed-timestep driver: the body model first, then every vehicle.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::celestial::system::CelestialBodyModel;
use crate::control::host::{FlightHost, VehicleHandle};
use crate::control::pilot::ControlInput;
use crate::control::rocket::{FlightPhase, Rocket};
use crate::errors::SimulationError;
use crate::persistence::VehicleRecord;

/// What happened to the vehicles during one tick.
#[derive(Debug, Default)]
pub struct TickReport {
    pub landed: Vec<VehicleHandle>,
    pub failed: Vec<(VehicleHandle, SimulationError)>,
}

impl TickReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug)]
pub struct FlightScheduler {
    bodies: CelestialBodyModel,
    vehicles: BTreeMap<VehicleHandle, Rocket>,
    elapsed: f64,
}

impl FlightScheduler {
    pub fn new(bodies: CelestialBodyModel) -> Self {
        FlightScheduler {
            bodies,
            vehicles: BTreeMap::new(),
            elapsed: 0.0,
        }
    }

    pub fn bodies(&self) -> &CelestialBodyModel {
        &self.bodies
    }

    pub fn bodies_mut(&mut self) -> &mut CelestialBodyModel {
        &mut self.bodies
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn launch(&mut self, rocket: Rocket) -> Result<(), SimulationError> {
        let handle = rocket.handle();
        if self.vehicles.contains_key(&handle) {
            return Err(SimulationError::PreconditionViolation(format!(
                "vehicle {} is already flying",
                handle.0
            )));
        }
        self.vehicles.insert(handle, rocket);
        Ok(())
    }

    pub fn vehicle(&self, handle: VehicleHandle) -> Option<&Rocket> {
        self.vehicles.get(&handle)
    }

    pub fn vehicles(&self) -> impl Iterator<Item = &Rocket> {
        self.vehicles.values()
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn receive_input(
        &mut self,
        handle: VehicleHandle,
        input: ControlInput,
    ) -> Result<(), SimulationError> {
        self.vehicles
            .get_mut(&handle)
            .ok_or_else(|| SimulationError::NotFound(format!("vehicle {}", handle.0)))?
            .receive_input(input);
        Ok(())
    }

    /// Advances the bodies, then each vehicle against the updated bodies.
    ///
    /// A failing body tick aborts the whole tick. A failing vehicle is
    /// reported and keeps its place for the next tick.
    pub fn tick<H: FlightHost>(&mut self, host: &mut H, dt: f64) -> Result<TickReport, SimulationError> {
        self.bodies.tick(dt)?;
        self.elapsed += dt;

        let mut report = TickReport::default();
        for (handle, rocket) in self.vehicles.iter_mut() {
            match rocket.tick(host, &self.bodies, dt) {
                Ok(FlightPhase::Landed) => report.landed.push(*handle),
                Ok(_) => {}
                Err(error) => {
                    warn!(vehicle = handle.0, %error, "Vehicle tick failed");
                    report.failed.push((*handle, error));
                }
            }
        }

        for handle in &report.landed {
            self.vehicles.remove(handle);
            info!(vehicle = handle.0, "Removed landed vehicle");
        }
        Ok(report)
    }

    pub fn save_vehicles(&self) -> Vec<VehicleRecord> {
        self.vehicles.values().map(Rocket::to_record).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::celestial::body::BodyHandle;
    use crate::config::FlightConfig;
    use crate::control::assembly::CapturedBlock;
    use crate::control::mission::FlightPlan;
    use crate::control::pilot::Cardinal;
    use crate::control::propulsion::ThrusterSpec;
    use crate::test_support::{three_body_chain, MockHost};
    use glam::IVec3;

    fn craft(fuel: f64) -> Vec<CapturedBlock> {
        vec![
            CapturedBlock::thruster(
                IVec3::new(0, 64, 0),
                2_000.0,
                ThrusterSpec::new(500_000.0, 350.0, 300.0).unwrap(),
            ),
            CapturedBlock::hydrogen_tank(IVec3::new(0, 65, 0), 1_000.0, fuel / 9.0, 2_000.0),
            CapturedBlock::oxygen_tank(IVec3::new(0, 66, 0), 1_000.0, fuel * 8.0 / 9.0, 16_000.0),
        ]
    }

    fn rocket(host: &mut MockHost, scheduler: &FlightScheduler, id: u64, origin: &str, fuel: f64) -> Rocket {
        host.manifests.insert(VehicleHandle(id), craft(fuel));
        let plan = FlightPlan {
            destination: "moon_orbit".to_string(),
            required_delta_v: 0.0,
            fuel_to_use: 0.0,
            arrival: None,
        };
        Rocket::assemble(
            VehicleHandle(id),
            &*host,
            scheduler.bodies(),
            origin,
            &plan,
            Cardinal::North,
            FlightConfig::default(),
        )
        .unwrap()
    }

    fn scheduler() -> FlightScheduler {
        let mut model = three_body_chain();
        model.initialize_orbits().unwrap();
        FlightScheduler::new(model)
    }

    #[test]
    fn test_failing_vehicle_is_isolated() {
        let mut scheduler = scheduler();
        let mut host = MockHost::for_chain(scheduler.bodies());
        let doomed = rocket(&mut host, &scheduler, 1, "overworld", 9_000.0);
        let healthy = rocket(&mut host, &scheduler, 2, "moon", 9_000.0);
        scheduler.launch(doomed).unwrap();
        scheduler.launch(healthy).unwrap();

        // the overworld now points at a body the model does not know
        host.dimensions.get_mut("overworld").unwrap().body = BodyHandle(99);

        for _ in 0..3 {
            let report = scheduler.tick(&mut host, 0.05).unwrap();
            assert_eq!(report.failed.len(), 1);
            assert_eq!(report.failed[0].0, VehicleHandle(1));
            assert!(matches!(report.failed[0].1, SimulationError::NotFound(_)));
        }
        assert_eq!(scheduler.len(), 2);
        assert_eq!(scheduler.vehicle(VehicleHandle(2)).unwrap().age(), 3);
        assert_eq!(scheduler.vehicle(VehicleHandle(2)).unwrap().phase(), FlightPhase::Launching);
    }

    #[test]
    fn test_landed_vehicles_are_dropped() {
        let mut scheduler = scheduler();
        let mut host = MockHost::for_chain(scheduler.bodies());
        host.ground = Some(0);
        let stranded = rocket(&mut host, &scheduler, 3, "overworld", 0.0);
        scheduler.launch(stranded).unwrap();

        let mut landed = Vec::new();
        for _ in 0..400 {
            let report = scheduler.tick(&mut host, 0.05).unwrap();
            assert!(report.is_clean());
            landed.extend(report.landed);
            if scheduler.is_empty() {
                break;
            }
        }
        assert_eq!(landed, vec![VehicleHandle(3)]);
        assert_eq!(host.placed.len(), 2);
    }

    #[test]
    fn test_duplicate_launch_and_unknown_input() {
        let mut scheduler = scheduler();
        let mut host = MockHost::for_chain(scheduler.bodies());
        let first = rocket(&mut host, &scheduler, 4, "overworld", 9_000.0);
        let second = first.clone();
        scheduler.launch(first).unwrap();
        assert!(matches!(
            scheduler.launch(second),
            Err(SimulationError::PreconditionViolation(_))
        ));
        assert!(matches!(
            scheduler.receive_input(VehicleHandle(5), ControlInput::default()),
            Err(SimulationError::NotFound(_))
        ));
        assert_eq!(scheduler.save_vehicles().len(), 1);
    }

    #[test]
    fn test_uninitialized_bodies_abort_the_tick() {
        let mut scheduler = FlightScheduler::new(three_body_chain());
        let mut host = MockHost::for_chain(scheduler.bodies());
        assert!(matches!(
            scheduler.tick(&mut host, 0.05),
            Err(SimulationError::PreconditionViolation(_))
        ));
    }
}
