use std::collections::{BTreeMap, HashMap};
use std::f64::consts::TAU;

use approx::assert_relative_eq;
use glam::{DVec3, IVec3};
use starflight_simulation::{
    control::guidance::landing_throttle, errors::SimulationError, Aabb, BlockManifestProvider,
    BodyRecord, CapturedBlock, Cardinal, CelestialBodyModel, ControlInput, DimensionData,
    EnvironmentProvider, FlightConfig, FlightPhase, FlightPlan, FlightRecorder, FlightScheduler,
    MoveOutcome, Rocket, SystemConfig, TelemetrySink, TelemetrySnapshot, ThrusterSpec,
    VehicleHandle, VehicleScan, WorldProbe, STANDARD_GRAVITY, TIME_STEP,
};

const SYSTEM: &str = r#"
    [[bodies]]
    name = "sol"
    mass = 1.989e30
    radius = 6.96e8
    parking_orbit_altitude = 6.96e7

    [[bodies]]
    name = "planet"
    parent = "sol"
    dimension = "overworld"
    mass = 5.97e24
    radius = 6.378e6
    parking_orbit_altitude = 6.378e5

    [bodies.orbit]
    periapsis = 1.496e11
    apoapsis = 1.496e11

    [bodies.rotation]
    obliquity = 0.41
    rotation_rate = 7.29e-5
    precession_rate = 1.0e-6

    [bodies.atmosphere]
    surface_pressure = 1.0
    has_oxygen = true

    [[bodies]]
    name = "moon"
    parent = "planet"
    dimension = "moon"
    mass = 7.342e22
    radius = 1.7374e6
    parking_orbit_altitude = 1.7374e5

    [bodies.orbit]
    periapsis = 3.6e8
    apoapsis = 4.05e8
    argument_of_periapsis = 0.3
    true_anomaly = 1.2
    inclination = 0.09

    [bodies.rotation]
    tidally_locked = true
"#;

/// Host with flat ground at a fixed height, or no ground at all.
#[derive(Default)]
struct TestHost {
    dimensions: HashMap<String, DimensionData>,
    manifests: HashMap<VehicleHandle, Vec<CapturedBlock>>,
    ground: Option<i32>,
    placed: Vec<(String, IVec3, usize)>,
    explosions: Vec<f64>,
    telemetry: Vec<TelemetrySnapshot>,
}

impl TestHost {
    fn new(model: &CelestialBodyModel) -> Self {
        let planet = model.handle_of("planet").unwrap();
        let moon = model.handle_of("moon").unwrap();
        let mut dimensions = HashMap::new();
        for (name, body, is_orbit, pressure) in [
            ("overworld", planet, false, 1.0),
            ("planet_orbit", planet, true, 0.0),
            ("moon", moon, false, 0.0),
            ("moon_orbit", moon, true, 0.0),
        ] {
            dimensions.insert(
                name.to_string(),
                DimensionData {
                    body,
                    is_orbit,
                    pressure,
                },
            );
        }
        TestHost {
            dimensions,
            ..TestHost::default()
        }
    }
}

impl EnvironmentProvider for TestHost {
    fn environment(&self, dimension: &str) -> Option<DimensionData> {
        self.dimensions.get(dimension).copied()
    }
}

impl BlockManifestProvider for TestHost {
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
        _rotation_steps: u8,
    ) -> Result<(), SimulationError> {
        self.placed.push((dimension.to_string(), origin, blocks.len()));
        Ok(())
    }
}

impl WorldProbe for TestHost {
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
        0.0
    }

    fn explode(&mut self, _dimension: &str, _at: DVec3, power: f64) {
        self.explosions.push(power);
    }
}

impl TelemetrySink for TestHost {
    fn publish(&mut self, _vehicle: VehicleHandle, snapshot: &TelemetrySnapshot) {
        self.telemetry.push(*snapshot);
    }
}

fn create_star_system() -> CelestialBodyModel {
    let config = SystemConfig::from_toml_str(SYSTEM).unwrap();
    let mut model = CelestialBodyModel::from_config(&config).unwrap();
    model.initialize_orbits().unwrap();
    model
}

/// Three-block column standing on y = 64: thruster, hydrogen tank, oxygen tank.
fn create_column(
    thruster: ThrusterSpec,
    thruster_mass: f64,
    hydrogen: (f64, f64),
    oxygen: (f64, f64),
) -> Vec<CapturedBlock> {
    vec![
        CapturedBlock::thruster(IVec3::new(0, 64, 0), thruster_mass, thruster),
        CapturedBlock::hydrogen_tank(IVec3::new(0, 65, 0), 1_000.0, hydrogen.0, hydrogen.1),
        CapturedBlock::oxygen_tank(IVec3::new(0, 66, 0), 1_000.0, oxygen.0, oxygen.1),
    ]
}

fn trip(destination: &str, fuel_to_use: f64) -> FlightPlan {
    FlightPlan {
        destination: destination.to_string(),
        required_delta_v: 0.0,
        fuel_to_use,
        arrival: None,
    }
}

#[test]
fn test_root_body_is_unperturbed_and_angles_stay_wrapped() {
    let mut model = create_star_system();
    let sol = model.handle_of("sol").unwrap();

    for tick in 0..10_000 {
        model.tick(TIME_STEP).unwrap();
        if tick % 2_500 == 0 {
            println!("t={:.1}s | planet at {:?}", tick as f64 * TIME_STEP, model.by_name("planet").unwrap().position());
        }
    }

    let root = model.get(sol).unwrap();
    assert_eq!(root.position(), DVec3::ZERO, "the root must not move");
    assert_eq!(root.velocity(), DVec3::ZERO, "the root must stay at rest");

    for (_, body) in model.iter() {
        for angle in [body.rotation(), body.precession(), body.parking_orbit_angle()] {
            assert!(
                (0.0..TAU).contains(&angle),
                "{} has an angle outside [0, 2π): {angle}",
                body.name()
            );
        }
    }
}

#[test]
fn test_initial_orbit_matches_elements() {
    let model = create_star_system();
    let planet = model.by_name("planet").unwrap();
    let moon = model.by_name("moon").unwrap();

    let distance = (moon.position() - planet.position()).length();
    let expected = moon.orbital_radius_at(moon.orbit().true_anomaly);
    assert_relative_eq!(distance, expected, max_relative = 1e-9);
    assert_eq!(moon.satellite_level(), 2);
}

#[test]
fn test_delta_v_between_planet_and_moon() {
    let model = create_star_system();
    let sol = model.handle_of("sol").unwrap();

    // circular moon orbit of the same radius as the unit test fixture
    let config = SystemConfig::from_toml_str(
        &SYSTEM
            .replace("periapsis = 3.6e8", "periapsis = 3.844e8")
            .replace("apoapsis = 4.05e8", "apoapsis = 3.844e8"),
    )
    .unwrap();
    let circular = CelestialBodyModel::from_config(&config).unwrap();
    let planet = circular.handle_of("planet").unwrap();
    let moon = circular.handle_of("moon").unwrap();

    let outbound = circular.delta_v_between(planet, moon).unwrap();
    let inbound = circular.delta_v_between(moon, planet).unwrap();
    println!("planet -> moon: {outbound:.3} m/s, moon -> planet: {inbound:.3} m/s");
    assert_relative_eq!(outbound, 3_834.626_996_294_212, max_relative = 1e-12);
    assert_relative_eq!(inbound, 3_834.626_996_294_212, max_relative = 1e-12);

    assert_eq!(model.delta_v_between(sol, sol).unwrap(), 0.0);
}

#[test]
fn test_landing_throttle_saturates() {
    let config = FlightConfig::default();
    let throttle = landing_throttle(-50.0, 100.0, STANDARD_GRAVITY, 20.0, 0.0, &config).unwrap();
    assert_eq!(throttle, 1.0, "(1250 + 980.665) / 2000 exceeds full throttle");

    let throttle = landing_throttle(-40.0, 100.0, STANDARD_GRAVITY, 40.0, 0.0, &config).unwrap();
    assert_relative_eq!(throttle, (800.0 + 980.665) / 4_000.0, max_relative = 1e-12);
}

#[test]
fn test_tsiolkovsky_ascent_and_fuel_conservation() {
    println!("INTEGRATION TEST: full-throttle ascent against the rocket equation");

    let model = create_star_system();
    let mut host = TestHost::new(&model);
    let vehicle = VehicleHandle(1);
    // 50 t in total, sea-level and vacuum ISP equal so thrust is the same everywhere
    host.manifests.insert(
        vehicle,
        create_column(
            ThrusterSpec::new(1_000_000.0, 350.0, 350.0).unwrap(),
            30_000.0,
            (2_000.0, 2_000.0),
            (16_000.0, 16_000.0),
        ),
    );
    let config = FlightConfig {
        travel_ceiling: 1.0e9,
        ..FlightConfig::default()
    };

    // "launch_pad" has no host data, so the craft sees Earth sea level
    let mut rocket = Rocket::assemble(
        vehicle,
        &host,
        &model,
        "launch_pad",
        &trip("moon", 0.0),
        Cardinal::North,
        config,
    )
    .unwrap();
    assert_eq!(rocket.craft_mass(), 50_000.0);
    let start = rocket.kinematics().position;
    let tanks = *rocket.tanks();

    rocket.receive_input(ControlInput::new(2, 0, 0, 0).unwrap());
    for _ in 0..600 {
        let phase = rocket.tick(&mut host, &model, TIME_STEP).unwrap();
        assert_eq!(phase, FlightPhase::Cruising);
    }

    let exhaust_velocity = 350.0 * STANDARD_GRAVITY;
    let mass_flow = 1_000_000.0 / exhaust_velocity;
    let t = 600.0 * TIME_STEP;
    let final_mass = 50_000.0 - mass_flow * t;
    let velocity = exhaust_velocity * (50_000.0 / final_mass).ln() - STANDARD_GRAVITY * t;
    let altitude = exhaust_velocity * (t + (final_mass / mass_flow) * (final_mass / 50_000.0).ln())
        - STANDARD_GRAVITY * t * t / 2.0;

    let climbed = rocket.kinematics().position.y - start.y;
    println!(
        "v = {:.2} m/s (expected {velocity:.2}), h = {climbed:.1} m (expected {altitude:.1}), m = {:.1} kg",
        rocket.kinematics().velocity.y,
        rocket.craft_mass()
    );
    assert_relative_eq!(rocket.kinematics().velocity.y, velocity, max_relative = 0.01);
    assert_relative_eq!(climbed, altitude, max_relative = 0.01);
    assert_relative_eq!(rocket.craft_mass(), final_mass, max_relative = 1e-9);

    // every kg that left the craft left the tanks, one part hydrogen to eight oxygen
    let burned = rocket.craft_mass_initial() - rocket.craft_mass();
    let hydrogen = tanks.hydrogen_supply - rocket.tanks().hydrogen_supply;
    let oxygen = tanks.oxygen_supply - rocket.tanks().oxygen_supply;
    assert_relative_eq!(burned, 600.0 * mass_flow * TIME_STEP, max_relative = 1e-9);
    assert_relative_eq!(hydrogen + oxygen, burned, max_relative = 1e-9);
    assert_relative_eq!(oxygen / hydrogen, 8.0, max_relative = 1e-9);
    assert_eq!(host.telemetry.len(), 600);
}

#[test]
fn test_flight_plan_from_scan() {
    let model = create_star_system();
    let host = TestHost::new(&model);
    let blocks = create_column(
        ThrusterSpec::new(500_000.0, 350.0, 300.0).unwrap(),
        2_000.0,
        (2_000.0, 2_000.0),
        (12_000.0, 16_000.0),
    );

    let scan = VehicleScan::from_blocks(&blocks, 1.0).unwrap();
    let ascent = FlightPlan::select(&model, &host, "overworld", "planet_orbit", &scan, None).unwrap();
    let planet = model.by_name("planet").unwrap();
    assert_relative_eq!(ascent.required_delta_v, planet.surface_to_orbit_dv(), max_relative = 1e-12);
    assert!(ascent.fuel_to_use > 0.0 && ascent.fuel_to_use < scan.mass);

    let landing = FlightPlan::select(&model, &host, "moon_orbit", "moon", &scan, None).unwrap();
    let moon = model.by_name("moon").unwrap();
    // airless: landing costs as much as the ascent
    assert_relative_eq!(landing.required_delta_v, moon.surface_to_orbit_dv(), max_relative = 1e-12);

    assert!(matches!(
        FlightPlan::select(&model, &host, "overworld", "nether", &scan, None),
        Err(SimulationError::NotFound(_))
    ));
}

#[test]
fn test_full_flight_to_the_moon() {
    println!("INTEGRATION TEST: launch, transfer and powered landing");

    let model = create_star_system();
    let mut host = TestHost::new(&model);
    host.ground = Some(64);
    let vehicle = VehicleHandle(42);
    let mut blocks = create_column(
        ThrusterSpec::new(500_000.0, 350.0, 300.0).unwrap(),
        2_000.0,
        (2_000.0, 2_000.0),
        (12_000.0, 16_000.0),
    );
    blocks.push(CapturedBlock::controller(IVec3::new(0, 67, 0), 500.0));
    host.manifests.insert(vehicle, blocks);

    let config = FlightConfig {
        travel_ceiling: 100.0,
        ..FlightConfig::default()
    };
    let rocket = Rocket::assemble(
        vehicle,
        &host,
        &model,
        "overworld",
        &trip("moon", 1_000.0),
        Cardinal::North,
        config,
    )
    .unwrap();

    let mut scheduler = FlightScheduler::new(model);
    scheduler.launch(rocket).unwrap();
    let mut recorder = FlightRecorder::new();
    let mut recorded = 0;
    let mut arrival_mass = None;

    for _ in 0..2_000 {
        let report = scheduler.tick(&mut host, TIME_STEP).unwrap();
        assert!(report.is_clean(), "tick failed: {:?}", report.failed);

        for snapshot in &host.telemetry[recorded..] {
            recorder.record(snapshot, TIME_STEP);
        }
        recorded = host.telemetry.len();

        if let Some(rocket) = scheduler.vehicle(vehicle) {
            if rocket.has_changed_dimension() && arrival_mass.is_none() {
                arrival_mass = Some(rocket.craft_mass());
                assert_eq!(rocket.dimension(), "moon");
            }
        }
        if !report.landed.is_empty() {
            break;
        }
    }
    recorder.log_summary();
    println!("{}", recorder.summary());

    assert!(scheduler.is_empty(), "the rocket should have landed");
    // the trip budget is spent by the time the craft reaches the moon
    assert_relative_eq!(arrival_mass.unwrap(), 18_500.0 - 1_000.0, max_relative = 1e-9);
    assert!(host.explosions.is_empty(), "landing should be soft");
    assert_eq!(host.placed.len(), 2);
    assert_eq!(host.placed[0].0, "moon");
    assert_eq!(host.placed[0].2, 3, "tanks and controller go first");
    assert_eq!(host.placed[1].2, 1);

    let phases: Vec<FlightPhase> = recorder.phase_times().iter().map(|(phase, _)| *phase).collect();
    // the jump itself publishes nothing, so it never reaches the recorder
    assert_eq!(
        phases,
        vec![
            FlightPhase::Launching,
            FlightPhase::Cruising,
            FlightPhase::Descending,
            FlightPhase::Landed
        ]
    );
}

#[test]
fn test_body_state_survives_json_round_trip() {
    let mut model = create_star_system();
    for _ in 0..100 {
        model.tick(TIME_STEP).unwrap();
    }
    let saved: BTreeMap<String, BodyRecord> = model.save_state();
    let json = serde_json::to_string(&saved).unwrap();

    let config = SystemConfig::from_toml_str(SYSTEM).unwrap();
    let mut restored = CelestialBodyModel::from_config(&config).unwrap();
    let loaded: BTreeMap<String, BodyRecord> = serde_json::from_str(&json).unwrap();
    restored.load_state(&loaded).unwrap();

    assert!(restored.is_initialized());
    assert_eq!(restored.save_state(), saved);

    model.tick(TIME_STEP).unwrap();
    restored.tick(TIME_STEP).unwrap();
    assert_eq!(
        restored.by_name("moon").unwrap().position(),
        model.by_name("moon").unwrap().position()
    );
}
