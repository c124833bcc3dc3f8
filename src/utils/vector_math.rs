//! Vector and quaternion helpers in the host's coordinate conventions.
//!
//! The host world is Y-up.

use std::f64::consts::TAU;

use glam::{DQuat, DVec3, EulerRot};

/// Rotates `v` about the global X axis.
///
/// The host turns +Y towards -Z for positive angles, the opposite sense
/// of glam's right-handed `from_rotation_x`.
pub fn rotate_x(v: DVec3, angle: f64) -> DVec3 {
    DQuat::from_rotation_x(-angle) * v
}

/// Rotates `v` about the global Y axis, right-handed: +X turns towards -Z.
pub fn rotate_y(v: DVec3, angle: f64) -> DVec3 {
    DQuat::from_rotation_y(angle) * v
}

/// Rodrigues rotation of `v` about an arbitrary (not necessarily unit) axis.
pub fn rotate_about_axis(v: DVec3, axis: DVec3, angle: f64) -> DVec3 {
    let axis = axis.normalize_or_zero();
    if axis == DVec3::ZERO {
        return v;
    }
    DQuat::from_axis_angle(axis, angle) * v
}

/// Quaternion for an X, then Y, then Z rotation.
pub fn euler_xyz(x: f64, y: f64, z: f64) -> DQuat {
    DQuat::from_euler(EulerRot::XYZ, x, y, z)
}

/// Wraps an angle into [0, 2π).
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid rounds tiny negative inputs up to exactly TAU
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Yaw of the quaternion's forward (+Z) axis, measured about +Y.
pub fn yaw_of(orientation: DQuat) -> f64 {
    let forward = orientation * DVec3::Z;
    forward.x.atan2(forward.z)
}

/// Returns `value` unchanged if its magnitude exceeds `epsilon`, otherwise 0.
pub fn snap_to_zero(value: f64, epsilon: f64) -> f64 {
    if value.abs() < epsilon {
        0.0
    } else {
        value
    }
}
