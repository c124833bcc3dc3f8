use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl Aabb {
    pub fn offset(&self, by: DVec3) -> Aabb {
        Aabb {
            min: self.min + by,
            max: self.max + by,
        }
    }

    pub fn contains(&self, point: DVec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

/// What the host's collision resolver allowed a move to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveOutcome {
    pub displacement: DVec3,
    pub vertical_collision: bool,
    pub horizontal_collision: bool,
}

impl MoveOutcome {
    /// A move through empty space.
    pub fn unobstructed(displacement: DVec3) -> Self {
        MoveOutcome {
            displacement,
            vertical_collision: false,
            horizontal_collision: false,
        }
    }

    pub fn collided(&self) -> bool {
        self.vertical_collision || self.horizontal_collision
    }
}

/// Rigid-body state of a craft. Velocity in m/s.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kinematics {
    pub position: DVec3,
    pub velocity: DVec3,
    pub orientation: DQuat,
}

impl Kinematics {
    pub fn new(position: DVec3) -> Self {
        Kinematics {
            position,
            velocity: DVec3::ZERO,
            orientation: DQuat::IDENTITY,
        }
    }

    /// Gravity pulls along the global -Y axis.
    pub fn apply_gravity(&mut self, gravity: f64, dt: f64) {
        self.velocity.y -= gravity * dt;
    }

    /// The craft's local up axis in world space.
    pub fn thrust_direction(&self) -> DVec3 {
        self.orientation * DVec3::Y
    }

    pub fn apply_thrust(&mut self, acceleration: f64, dt: f64) {
        self.velocity += self.thrust_direction() * (acceleration * dt);
    }

    pub fn rotate(&mut self, step: DQuat) {
        self.orientation = (self.orientation * step).normalize();
    }

    /// Applies a resolved move: collisions stop motion on the blocked axes.
    pub fn apply_move(&mut self, outcome: &MoveOutcome) {
        self.position += outcome.displacement;
        if outcome.vertical_collision {
            self.velocity.y = 0.0;
        }
        if outcome.horizontal_collision {
            self.velocity.x = 0.0;
            self.velocity.z = 0.0;
        }
    }

    pub fn speed(&self) -> f64 {
        self.velocity.length()
    }

    /// Integer block coordinates of the position.
    pub fn block_position(&self) -> glam::IVec3 {
        self.position.floor().as_ivec3()
    }
}
