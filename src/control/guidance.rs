//! Autopilot throttle laws for unattended launches and landings.

use crate::config::FlightConfig;
use crate::errors::{ensure_finite, SimulationError};

/// Autopilot output for one tick of a launch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaunchCommand {
    pub throttle: f64,
    /// Vertical speed to hold, when the climb has to be capped.
    pub hold_vertical_speed: Option<f64>,
}

/// Launch autopilot.
///
/// Under gravity the engines run at full throttle unless that would exceed
/// a G limit of twice local gravity (never less than 4 m/s²). Without
/// gravity the craft climbs at a fixed cruise speed.
pub fn launch_throttle(
    gravity: f64,
    thrust: f64,
    mass: f64,
    vertical_speed: f64,
    config: &FlightConfig,
) -> Result<LaunchCommand, SimulationError> {
    if gravity == 0.0 {
        let throttle = if vertical_speed < config.zero_g_speed {
            1.0
        } else {
            0.0
        };
        let hold_vertical_speed =
            (vertical_speed > config.zero_g_speed).then_some(config.zero_g_speed);
        return Ok(LaunchCommand {
            throttle,
            hold_vertical_speed,
        });
    }

    let max_acceleration = (gravity * config.launch_g_limit_factor).max(config.min_launch_g_limit);
    let throttle = if thrust / mass > max_acceleration {
        ensure_finite(mass * max_acceleration / thrust, "launch throttle")?
    } else {
        1.0
    };
    Ok(LaunchCommand {
        throttle,
        hold_vertical_speed: None,
    })
}

/// Throttle that brings the craft to rest at its landing height.
///
/// Energy balance: the thrust work over the remaining height must absorb
/// the kinetic energy plus the potential energy lost on the way down,
/// `t = (v²/2 + g·h) / (a_max·h)`. Engines only light when the required
/// throttle passes the hysteresis gate, or keep burning if already lit.
pub fn landing_throttle(
    vertical_speed: f64,
    height: f64,
    gravity: f64,
    max_acceleration: f64,
    current_throttle: f64,
    config: &FlightConfig,
) -> Result<f64, SimulationError> {
    let min_height = if gravity > 0.0 {
        config.landing_min_height
    } else {
        config.landing_min_height_zero_g
    };
    if height <= min_height {
        return Ok(0.0);
    }
    if !(max_acceleration > 0.0) {
        return Err(SimulationError::ArithmeticDomainError(format!(
            "landing needs positive thrust acceleration, got {max_acceleration}"
        )));
    }

    let required = ((vertical_speed.powi(2) * 0.5) + gravity * height) / (max_acceleration * height);
    let required = ensure_finite(required.min(1.0), "landing throttle")?;

    let lit = if gravity > 0.0 {
        required > config.landing_throttle_gate || current_throttle > 0.0
    } else {
        required > config.landing_throttle_gate
    };
    Ok(if lit { required } else { 0.0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::STANDARD_GRAVITY;
    use approx::assert_relative_eq;

    #[test]
    fn test_launch_full_throttle_when_under_limit() {
        let config = FlightConfig::default();
        // 15 m/s² available, limit is 2g
        let command = launch_throttle(STANDARD_GRAVITY, 750_000.0, 50_000.0, 0.0, &config).unwrap();
        assert_eq!(command.throttle, 1.0);
        assert_eq!(command.hold_vertical_speed, None);
    }

    #[test]
    fn test_launch_throttle_capped_by_g_limit() {
        let config = FlightConfig::default();
        let command =
            launch_throttle(STANDARD_GRAVITY, 2_000_000.0, 50_000.0, 0.0, &config).unwrap();
        assert_relative_eq!(
            command.throttle,
            50_000.0 * 2.0 * STANDARD_GRAVITY / 2_000_000.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_launch_limit_has_a_floor() {
        let config = FlightConfig::default();
        // Low gravity: 2g = 1 m/s² is raised to 4 m/s².
        let command = launch_throttle(0.5, 500_000.0, 50_000.0, 0.0, &config).unwrap();
        assert_relative_eq!(command.throttle, 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_g_launch_holds_cruise_speed() {
        let config = FlightConfig::default();
        let slow = launch_throttle(0.0, 1.0e6, 5.0e4, 0.0, &config).unwrap();
        assert_eq!(slow.throttle, 1.0);
        assert_eq!(slow.hold_vertical_speed, None);

        let fast = launch_throttle(0.0, 1.0e6, 5.0e4, config.zero_g_speed + 1.0, &config).unwrap();
        assert_eq!(fast.throttle, 0.0);
        assert_eq!(fast.hold_vertical_speed, Some(config.zero_g_speed));
    }

    #[test]
    fn test_landing_throttle_saturates() {
        let config = FlightConfig::default();
        // (1250 + 980.665) / 2000 > 1
        let throttle = landing_throttle(-50.0, 100.0, STANDARD_GRAVITY, 20.0, 0.0, &config).unwrap();
        assert_eq!(throttle, 1.0);
    }

    #[test]
    fn test_landing_throttle_literal_value() {
        let config = FlightConfig::default();
        let throttle =
            landing_throttle(-20.0, 100.0, STANDARD_GRAVITY, 30.0, 0.5, &config).unwrap();
        assert_relative_eq!(throttle, (200.0 + 980.665) / 3000.0, epsilon = 1e-12);
    }

    #[test]
    fn test_landing_hysteresis_gate() {
        let config = FlightConfig::default();
        // Required throttle ~0.39 stays off until the engines are already lit.
        let off = landing_throttle(-20.0, 100.0, STANDARD_GRAVITY, 30.0, 0.0, &config).unwrap();
        assert_eq!(off, 0.0);

        // Without gravity the gate always applies.
        let zero_g = landing_throttle(-20.0, 100.0, 0.0, 30.0, 0.5, &config).unwrap();
        assert_eq!(zero_g, 0.0);
        let zero_g_late = landing_throttle(-20.0, 5.0, 0.0, 30.0, 0.0, &config).unwrap();
        assert_eq!(zero_g_late, 1.0);
    }

    #[test]
    fn test_landing_throttle_off_near_ground() {
        let config = FlightConfig::default();
        let throttle = landing_throttle(-5.0, 0.1, STANDARD_GRAVITY, 30.0, 1.0, &config).unwrap();
        assert_eq!(throttle, 0.0);
        let throttle = landing_throttle(-5.0, 0.0, STANDARD_GRAVITY, 30.0, 1.0, &config).unwrap();
        assert_eq!(throttle, 0.0);
    }
}
