use serde::{Deserialize, Serialize};

use crate::constants::{HYDROGEN_MASS_FRACTION, OXYGEN_MASS_FRACTION};
use crate::control::assembly::{BlockKind, CapturedBlock};
use crate::errors::{ensure_finite, SimulationError};

/// Hydrogen and oxygen carried by a vehicle, in kg.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PropellantTanks {
    pub hydrogen_supply: f64,
    pub hydrogen_capacity: f64,
    pub oxygen_supply: f64,
    pub oxygen_capacity: f64,
}

impl PropellantTanks {
    /// Sums the tanks of a block manifest. Tanks on redstone-powered blocks
    /// are isolated from the engines and do not count.
    pub fn from_blocks<'a>(blocks: impl IntoIterator<Item = &'a CapturedBlock>) -> Self {
        let mut tanks = PropellantTanks::default();
        for block in blocks {
            if block.redstone_powered {
                continue;
            }
            match block.kind {
                BlockKind::HydrogenTank => {
                    tanks.hydrogen_supply += block.stored_fluid;
                    tanks.hydrogen_capacity += block.storage_capacity;
                }
                BlockKind::OxygenTank => {
                    tanks.oxygen_supply += block.stored_fluid;
                    tanks.oxygen_capacity += block.storage_capacity;
                }
                _ => {}
            }
        }
        tanks
    }

    pub fn has_propellant(&self) -> bool {
        self.hydrogen_supply > 0.0 && self.oxygen_supply > 0.0
    }

    /// Burns `mass` kg of propellant at the 1:8 ratio of water.
    pub fn draw(&mut self, mass: f64) {
        self.hydrogen_supply -= mass * HYDROGEN_MASS_FRACTION;
        self.oxygen_supply -= mass * OXYGEN_MASS_FRACTION;
    }

    pub fn hydrogen_level(&self) -> f64 {
        level(self.hydrogen_supply, self.hydrogen_capacity)
    }

    pub fn oxygen_level(&self) -> f64 {
        level(self.oxygen_supply, self.oxygen_capacity)
    }

    /// Propellant mass that can be burned before either supply runs out.
    pub fn usable_propellant(&self) -> f64 {
        (self.oxygen_supply + self.oxygen_supply / 8.0)
            .min(self.hydrogen_supply + self.hydrogen_supply * 8.0)
    }

    /// The same tanks filled to capacity.
    pub fn full(&self) -> Self {
        PropellantTanks {
            hydrogen_supply: self.hydrogen_capacity,
            oxygen_supply: self.oxygen_capacity,
            ..*self
        }
    }

    pub fn missing_propellant(&self) -> f64 {
        (self.hydrogen_capacity - self.hydrogen_supply) + (self.oxygen_capacity - self.oxygen_supply)
    }
}

fn level(supply: f64, capacity: f64) -> f64 {
    if capacity > 0.0 {
        supply / capacity
    } else {
        0.0
    }
}

/// Delta-v from burning every usable kg of propellant, by the rocket equation.
pub fn available_delta_v(
    initial_mass: f64,
    tanks: &PropellantTanks,
    exhaust_velocity: f64,
) -> Result<f64, SimulationError> {
    let final_mass = initial_mass - tanks.usable_propellant();
    if !(initial_mass > 0.0 && final_mass > 0.0) {
        return Err(SimulationError::ArithmeticDomainError(format!(
            "mass ratio {initial_mass} / {final_mass} is not positive"
        )));
    }
    ensure_finite(
        exhaust_velocity * (initial_mass / final_mass).ln(),
        "available delta-v",
    )
}

/// Propellant a vehicle of `initial_mass` burns to change its speed by `delta_v`.
pub fn propellant_for_delta_v(
    initial_mass: f64,
    delta_v: f64,
    exhaust_velocity: f64,
) -> Result<f64, SimulationError> {
    if !(exhaust_velocity > 0.0) {
        return Err(SimulationError::ArithmeticDomainError(format!(
            "exhaust velocity must be positive, got {exhaust_velocity}"
        )));
    }
    ensure_finite(
        initial_mass * (1.0 - (-delta_v / exhaust_velocity).exp()),
        "propellant for delta-v",
    )
}
