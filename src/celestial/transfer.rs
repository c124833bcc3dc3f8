//! Delta-v budgeting between parking orbits.

use tracing::trace;

use crate::celestial::body::{BodyHandle, CelestialBody};
use crate::celestial::system::CelestialBodyModel;
use crate::errors::{ensure_finite, SimulationError};

/// Folds the escape requirement of one hierarchy level into the running
/// budget. Returns the hyperbolic excess carried to the next level.
fn accumulate_escape(escape: f64, start_speed: f64, dv_total: &mut f64) -> f64 {
    if escape > start_speed {
        *dv_total += escape - start_speed;
        escape
    } else {
        escape + (start_speed - escape)
    }
}

impl CelestialBodyModel {
    /// Delta-v from the parking orbit of `from` to the parking orbit of `to`.
    ///
    /// Climbs from `from` toward the root, paying the escape cost at each
    /// level, until reaching the body whose satellites contain `to`. The
    /// descent from there to `to` is costed the same way, and one Hohmann
    /// transfer around the meeting body joins the two legs. Each direction is
    /// costed on its own; callers should not assume symmetry.
    pub fn delta_v_between(&self, from: BodyHandle, to: BodyHandle) -> Result<f64, SimulationError> {
        let origin = self.get(from)?;
        self.get(to)?;

        let mut esc1 = 0.0;
        let mut dv_esc1 = 0.0;
        let mut start_v1 = origin.circular_orbit_velocity(origin.parking_orbit_radius());
        let mut orbit_radius = origin.parking_orbit_radius();
        let mut current = from;

        loop {
            let body = self.get(current)?;
            if current == to {
                let dv = body.hohmann_transfer_dv(orbit_radius, body.parking_orbit_radius(), esc1, 0.0)?
                    + dv_esc1;
                return ensure_finite(dv, "transfer delta-v");
            }

            if let Some(path) = self.descent_path(current, to)? {
                let target = self.get(path[0])?;
                let mut esc2 = 0.0;
                let mut dv_esc2 = 0.0;
                let mut start_v2 = target.circular_orbit_velocity(target.parking_orbit_radius());

                for (i, &handle) in path.iter().enumerate() {
                    let step = self.get(handle)?;
                    let radius = if i == 0 {
                        step.parking_orbit_radius()
                    } else {
                        self.get(path[i - 1])?.semi_major_axis()
                    };
                    esc2 = accumulate_escape(step.escape_velocity(radius), start_v2, &mut dv_esc2);
                    let parent = self.parent_body(handle)?;
                    start_v2 = parent.circular_orbit_velocity(step.semi_major_axis()) + esc2;
                }

                let outermost = self.get(path[path.len() - 1])?;
                let dv = body.hohmann_transfer_dv(
                    orbit_radius,
                    outermost.semi_major_axis(),
                    esc1,
                    esc2,
                )? + dv_esc1
                    + dv_esc2;
                trace!(from = from.index(), to = to.index(), dv, "Computed transfer delta-v");
                return ensure_finite(dv, "transfer delta-v");
            }

            let Some(parent) = body.parent() else {
                return Err(SimulationError::NotFound(format!(
                    "no transfer path from '{}' to '{}'",
                    origin.name(),
                    self.get(to)?.name()
                )));
            };
            esc1 = accumulate_escape(body.escape_velocity(orbit_radius), start_v1, &mut dv_esc1);
            orbit_radius = body.semi_major_axis();
            start_v1 = self.get(parent)?.circular_orbit_velocity(orbit_radius) + esc1;
            current = parent;
        }
    }

    /// Launch cost from the surface of `body` to its parking orbit.
    pub fn surface_to_orbit_delta_v(&self, body: BodyHandle) -> Result<f64, SimulationError> {
        ensure_finite(self.get(body)?.surface_to_orbit_dv(), "ascent delta-v")
    }

    /// Landing cost from the parking orbit of `body` to its surface.
    pub fn orbit_to_surface_delta_v(&self, body: BodyHandle) -> Result<f64, SimulationError> {
        ensure_finite(self.get(body)?.orbit_to_surface_dv(), "landing delta-v")
    }

    /// Chain `[target, parent of target, ..., satellite of ancestor]` when
    /// `target` is a strict descendant of `ancestor`.
    fn descent_path(
        &self,
        ancestor: BodyHandle,
        target: BodyHandle,
    ) -> Result<Option<Vec<BodyHandle>>, SimulationError> {
        let mut path = Vec::new();
        let mut cursor = target;
        while let Some(parent) = self.get(cursor)?.parent() {
            path.push(cursor);
            if parent == ancestor {
                return Ok(Some(path));
            }
            cursor = parent;
        }
        Ok(None)
    }

    fn parent_body(
        &self,
        handle: BodyHandle,
    ) -> Result<&CelestialBody, SimulationError> {
        let body = self.get(handle)?;
        let parent = body.parent().ok_or_else(|| {
            SimulationError::NotFound(format!("parent of '{}'", body.name()))
        })?;
        self.get(parent)
    }
}
