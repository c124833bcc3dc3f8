use glam::DVec3;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::control::rocket::FlightPhase;

/// Observable state of a vehicle, published once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub thrust_underexpanded: bool,
    pub user_input: bool,
    pub throttle: f64,
    /// Height of the craft's bottom above the ground below it.
    pub altitude: f64,
    pub velocity: DVec3,
    pub hydrogen_level: f64,
    pub oxygen_level: f64,
    pub phase: FlightPhase,
}

/// Collects snapshots of one flight and summarizes them.
#[derive(Debug, Clone)]
pub struct FlightRecorder {
    pub log: Vec<(f64, TelemetrySnapshot)>,
    max_speed: f64,
    max_altitude: f64,
    min_propellant_level: f64,
    phase_times: Vec<(FlightPhase, f64)>,
    elapsed: f64,
}

impl Default for FlightRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl FlightRecorder {
    pub fn new() -> Self {
        FlightRecorder {
            log: Vec::new(),
            max_speed: 0.0,
            max_altitude: 0.0,
            min_propellant_level: f64::MAX,
            phase_times: Vec::new(),
            elapsed: 0.0,
        }
    }

    /// Flight clock as `h:mm:ss.ss`.
    fn format_clock(seconds: f64) -> String {
        let seconds = seconds.max(0.0);
        let hours = (seconds / 3600.0).floor();
        let minutes = ((seconds - hours * 3600.0) / 60.0).floor();
        let rest = seconds - hours * 3600.0 - minutes * 60.0;
        format!("{hours:.0}:{minutes:02.0}:{rest:05.2}")
    }

    fn format_distance(meters: f64) -> String {
        const UNITS: [(f64, &str); 3] = [(1.0e6, "Mm"), (1.0e3, "km"), (1.0, "m")];
        let (scale, unit) = UNITS
            .into_iter()
            .find(|(scale, _)| meters.abs() >= *scale)
            .unwrap_or((1.0, "m"));
        format!("{:.2} {unit}", meters / scale)
    }

    pub fn record(&mut self, snapshot: &TelemetrySnapshot, dt: f64) {
        self.elapsed += dt;

        self.max_speed = self.max_speed.max(snapshot.velocity.length());
        self.max_altitude = self.max_altitude.max(snapshot.altitude);
        self.min_propellant_level = self
            .min_propellant_level
            .min(snapshot.hydrogen_level.min(snapshot.oxygen_level));

        match self.phase_times.last() {
            Some((phase, _)) if *phase == snapshot.phase => {}
            _ => self.phase_times.push((snapshot.phase, self.elapsed)),
        }
        self.log.push((self.elapsed, *snapshot));
    }

    pub fn max_speed(&self) -> f64 {
        self.max_speed
    }

    pub fn max_altitude(&self) -> f64 {
        self.max_altitude
    }

    /// Lowest propellant fraction seen, or `None` before the first record.
    pub fn min_propellant_level(&self) -> Option<f64> {
        (!self.log.is_empty()).then_some(self.min_propellant_level)
    }

    pub fn phase_times(&self) -> &[(FlightPhase, f64)] {
        &self.phase_times
    }

    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("Flight time: {}", Self::format_clock(self.elapsed)),
            format!("Max speed: {:.2} m/s", self.max_speed),
            format!("Max altitude: {}", Self::format_distance(self.max_altitude)),
        ];
        if let Some(level) = self.min_propellant_level() {
            lines.push(format!("Min propellant: {:.1}%", level * 100.0));
        }
        for (phase, time) in &self.phase_times {
            lines.push(format!("{:?} at {}", phase, Self::format_clock(*time)));
        }
        lines.join("\n")
    }

    pub fn log_summary(&self) {
        info!(
            elapsed = self.elapsed,
            max_speed = self.max_speed,
            max_altitude = self.max_altitude,
            "Flight summary\n{}",
            self.summary()
        );
    }
}
