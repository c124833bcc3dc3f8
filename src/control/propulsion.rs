use serde::{Deserialize, Serialize};

use crate::constants::STANDARD_GRAVITY;
use crate::errors::{ensure_finite, SimulationError};

/// Performance of a single thruster block.
///
/// Mass flow is fixed by the vacuum rating; specific impulse falls linearly
/// with ambient pressure, so thrust does too.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThrusterSpec {
    /// N
    pub vacuum_thrust: f64,
    /// s
    pub vacuum_isp: f64,
    /// s, at one Earth atmosphere
    pub sea_level_isp: f64,
}

impl ThrusterSpec {
    pub fn new(vacuum_thrust: f64, vacuum_isp: f64, sea_level_isp: f64) -> Result<Self, SimulationError> {
        if !(vacuum_thrust.is_finite() && vacuum_thrust > 0.0) {
            return Err(SimulationError::ConfigError(format!(
                "thruster vacuum thrust must be positive, got {vacuum_thrust}"
            )));
        }
        if !(vacuum_isp.is_finite() && vacuum_isp > 0.0) {
            return Err(SimulationError::ConfigError(format!(
                "thruster vacuum ISP must be positive, got {vacuum_isp}"
            )));
        }
        if !(sea_level_isp.is_finite() && sea_level_isp >= 0.0) {
            return Err(SimulationError::ConfigError(format!(
                "thruster sea-level ISP must be non-negative, got {sea_level_isp}"
            )));
        }
        Ok(ThrusterSpec {
            vacuum_thrust,
            vacuum_isp,
            sea_level_isp,
        })
    }

    /// kg/s at full throttle
    pub fn mass_flow(&self) -> f64 {
        self.vacuum_thrust / (STANDARD_GRAVITY * self.vacuum_isp)
    }

    pub fn isp(&self, pressure: f64) -> f64 {
        (self.vacuum_isp - (self.vacuum_isp - self.sea_level_isp) * pressure).max(0.0)
    }

    pub fn thrust(&self, pressure: f64) -> f64 {
        self.mass_flow() * STANDARD_GRAVITY * self.isp(pressure)
    }
}

/// Combined engine performance of a vehicle at its origin and destination.
///
/// Both ends are fixed at assembly time from the ambient pressure of the
/// departure and arrival dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropulsionSystem {
    pub nominal_thrust_start: f64,
    pub nominal_thrust_end: f64,
    pub start_isp: f64,
    pub end_isp: f64,
}

impl PropulsionSystem {
    pub fn from_thrusters<'a>(
        thrusters: impl IntoIterator<Item = &'a ThrusterSpec>,
        start_pressure: f64,
        end_pressure: f64,
    ) -> Result<Self, SimulationError> {
        let mut count = 0;
        let mut thrust_start = 0.0;
        let mut thrust_end = 0.0;
        let mut mass_flow = 0.0;

        for thruster in thrusters {
            count += 1;
            thrust_start += thruster.thrust(start_pressure);
            thrust_end += thruster.thrust(end_pressure);
            mass_flow += thruster.mass_flow();
        }

        if count == 0 {
            return Err(SimulationError::PreconditionViolation(
                "vehicle has no active thrusters".to_string(),
            ));
        }
        for (thrust, pressure) in [(thrust_start, start_pressure), (thrust_end, end_pressure)] {
            if thrust <= 0.0 {
                return Err(SimulationError::PreconditionViolation(format!(
                    "thrusters produce no thrust at {pressure} atm"
                )));
            }
        }

        Ok(PropulsionSystem {
            nominal_thrust_start: thrust_start,
            nominal_thrust_end: thrust_end,
            start_isp: ensure_finite(thrust_start / (STANDARD_GRAVITY * mass_flow), "origin ISP")?,
            end_isp: ensure_finite(thrust_end / (STANDARD_GRAVITY * mass_flow), "destination ISP")?,
        })
    }

    /// Full-throttle thrust before or after the dimension transfer.
    pub fn thrust(&self, arrived: bool) -> f64 {
        if arrived {
            self.nominal_thrust_end
        } else {
            self.nominal_thrust_start
        }
    }

    pub fn isp(&self, arrived: bool) -> f64 {
        if arrived {
            self.end_isp
        } else {
            self.start_isp
        }
    }

    /// Propellant consumption (kg/s) while producing `force`.
    pub fn mass_flow(&self, force: f64, arrived: bool) -> Result<f64, SimulationError> {
        let isp = self.isp(arrived);
        if isp <= 0.0 {
            return Err(SimulationError::ArithmeticDomainError(format!(
                "cannot burn propellant with an ISP of {isp} s"
            )));
        }
        ensure_finite(force / (STANDARD_GRAVITY * isp), "mass flow")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn engine() -> ThrusterSpec {
        ThrusterSpec::new(1_000_000.0, 350.0, 300.0).unwrap()
    }

    #[test]
    fn test_thruster_isp_falls_with_pressure() {
        let thruster = engine();
        assert_eq!(thruster.isp(0.0), 350.0);
        assert_eq!(thruster.isp(1.0), 300.0);
        assert_eq!(thruster.isp(100.0), 0.0);
        assert_relative_eq!(thruster.thrust(0.0), 1_000_000.0, max_relative = 1e-12);
        assert_relative_eq!(
            thruster.thrust(1.0),
            1_000_000.0 * 300.0 / 350.0,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_invalid_thruster_is_rejected() {
        assert!(matches!(
            ThrusterSpec::new(0.0, 350.0, 300.0),
            Err(SimulationError::ConfigError(_))
        ));
        assert!(matches!(
            ThrusterSpec::new(1.0, f64::NAN, 300.0),
            Err(SimulationError::ConfigError(_))
        ));
    }

    #[test]
    fn test_system_combines_thrusters() {
        let big = engine();
        let small = ThrusterSpec::new(250_000.0, 320.0, 280.0).unwrap();
        let system = PropulsionSystem::from_thrusters([&big, &small], 1.0, 0.0).unwrap();

        assert_relative_eq!(system.nominal_thrust_end, 1_250_000.0, max_relative = 1e-12);
        let flow = big.mass_flow() + small.mass_flow();
        assert_relative_eq!(
            system.start_isp,
            system.nominal_thrust_start / (STANDARD_GRAVITY * flow),
            max_relative = 1e-12
        );
        assert!(system.start_isp < system.end_isp);
        assert_eq!(system.thrust(true), system.nominal_thrust_end);
        assert_eq!(system.isp(false), system.start_isp);
    }

    #[test]
    fn test_zero_thrusters_is_precondition_violation() {
        let result = PropulsionSystem::from_thrusters(std::iter::empty(), 1.0, 0.0);
        assert!(matches!(
            result,
            Err(SimulationError::PreconditionViolation(_))
        ));
    }

    #[test]
    fn test_mass_flow_matches_rocket_equation() {
        let system = PropulsionSystem::from_thrusters([&engine()], 0.0, 0.0).unwrap();
        assert_relative_eq!(
            system.mass_flow(1_000_000.0, false).unwrap(),
            1_000_000.0 / (STANDARD_GRAVITY * 350.0),
            max_relative = 1e-12
        );

        let choked = PropulsionSystem {
            nominal_thrust_start: 0.0,
            start_isp: 0.0,
            ..system
        };
        assert!(matches!(
            choked.mass_flow(1.0, false),
            Err(SimulationError::ArithmeticDomainError(_))
        ));
    }

    #[test]
    fn test_choked_engines_are_rejected() {
        let no_sea_level = ThrusterSpec::new(1_000_000.0, 350.0, 0.0).unwrap();
        assert!(matches!(
            PropulsionSystem::from_thrusters([&no_sea_level], 1.0, 0.0),
            Err(SimulationError::PreconditionViolation(_))
        ));
        assert!(matches!(
            PropulsionSystem::from_thrusters([&engine()], 0.0, 100.0),
            Err(SimulationError::PreconditionViolation(_))
        ));
        assert!(PropulsionSystem::from_thrusters([&no_sea_level], 0.5, 0.0).is_ok());
    }
}
