// Physical Constants
pub const GRAVITATIONAL_CONSTANT: f64 = 6.67430e-11; // N⋅m²/kg²
pub const STANDARD_GRAVITY: f64 = 9.80665; // m/s²
pub const EARTH_MASS: f64 = 5.97e24; // kg
pub const EARTH_RADIUS: f64 = 6.3780e6; // meters
pub const ASTRONOMICAL_UNIT: f64 = 1.496e11; // meters

// Orbit Initialization
pub const TANGENT_STEP: f64 = 1e-4; // rad, finite-difference step in true anomaly

// Delta-v Budgeting
pub const ASCENT_GRAVITY_LOSS_FACTOR: f64 = 1.08;
pub const ASCENT_DRAG_COEFFICIENT: f64 = 1000.0; // m/s per atm^(7/11)
pub const ASCENT_DRAG_EXPONENT: f64 = 7.0 / 11.0;
pub const LANDING_MARGIN_DV: f64 = 500.0; // m/s
pub const AEROBRAKING_MIN_PRESSURE: f64 = 1e-4; // atm

// Propellant (hydrogen : oxygen by mass, stoichiometric water)
pub const HYDROGEN_MASS_FRACTION: f64 = 1.0 / 9.0;
pub const OXYGEN_MASS_FRACTION: f64 = 8.0 / 9.0;

// Simulation Parameters
pub const TIME_STEP: f64 = 0.05; // s, one host tick

// Flight Envelope
pub const TRAVEL_CEILING: f64 = 1024.0; // m
pub const TRAVEL_CEILING_ORBIT: f64 = 512.0; // m
pub const ZERO_G_SPEED: f64 = 40.0; // m/s
pub const MIN_LAUNCH_G_LIMIT: f64 = 4.0; // m/s²
pub const LAUNCH_G_LIMIT_FACTOR: f64 = 2.0;
pub const LANDING_THROTTLE_GATE: f64 = 0.8;
pub const LANDING_MIN_HEIGHT: f64 = 0.15; // m
pub const LANDING_MIN_HEIGHT_ZERO_G: f64 = 0.1; // m
pub const FALLBACK_LANDING_ALTITUDE: i32 = 64;
pub const MIN_LANDING_AGE: u32 = 10; // ticks
pub const CRASH_SPEED_THRESHOLD: f64 = 10.0; // m/s
pub const CRASH_POWER_DIVISOR: f64 = 5.0;
pub const MAX_EXPLOSION_POWER: f64 = 10.0;
pub const UNDEREXPANSION_THRESHOLD: f64 = 0.25;

// Pilot Controls
pub const THROTTLE_STEP: f64 = 0.01; // per tick
pub const ROTATION_RATE_STEP: f64 = 0.0025; // rad/tick added per tick of input
pub const ROTATION_RATE_DECAY: f64 = 0.8; // per tick without input
pub const ROTATION_RATE_EPSILON: f64 = 1e-4; // rad/tick
