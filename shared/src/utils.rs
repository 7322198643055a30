use crate::YAW_EPS;
use nalgebra::{Vector2, Vector3};
use std::f32::consts::{PI, TAU};

/// Project a world position onto the XZ plane.
pub fn to_planar(v: &Vector3<f32>) -> Vector2<f32> {
    Vector2::new(v.x, v.z)
}

/// Facing yaw for a planar (XZ) direction.
///
/// Convention: yaw 0 faces -Z, i.e. `yaw = atan2(-dx, -dz)`.
pub fn yaw_from_xz(xz: &Vector2<f32>) -> Option<f32> {
    if xz.norm_squared() > YAW_EPS {
        return Some((-xz[0]).atan2(-xz[1]));
    }

    None
}

/// Unit planar forward vector for a yaw (inverse of [`yaw_from_xz`]).
pub fn forward_from_yaw(yaw: f32) -> Vector2<f32> {
    Vector2::new(-yaw.sin(), -yaw.cos())
}

/// Unit planar right vector for a yaw.
pub fn right_from_yaw(yaw: f32) -> Vector2<f32> {
    Vector2::new(yaw.cos(), -yaw.sin())
}

/// Planar (XZ) distance squared between two world positions (meters^2).
pub fn planar_distance_sq(a: &Vector3<f32>, b: &Vector3<f32>) -> f32 {
    let x = b.x - a.x;
    let z = b.z - a.z;
    x * x + z * z
}

/// Wrap an angle into `(-PI, PI]`.
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI { wrapped + TAU } else { wrapped }
}

/// Interpolate between two yaws along the shortest arc.
pub fn lerp_angle(from: f32, to: f32, t: f32) -> f32 {
    wrap_angle(from + wrap_angle(to - from) * t)
}

/// Rotate `from` toward `to` along the shortest arc by at most `max_step` radians.
pub fn approach_angle(from: f32, to: f32, max_step: f32) -> f32 {
    let delta = wrap_angle(to - from);
    if delta.abs() <= max_step {
        return wrap_angle(to);
    }
    wrap_angle(from + max_step.copysign(delta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn yaw_round_trips_through_forward() {
        for yaw in [-3.0_f32, -1.2, 0.0, 0.7, 2.9] {
            let fwd = forward_from_yaw(yaw);
            let back = yaw_from_xz(&fwd).unwrap();
            assert_abs_diff_eq!(wrap_angle(back - yaw), 0.0, epsilon = 1.0e-5);
        }
    }

    #[test]
    fn right_is_perpendicular_to_forward() {
        let fwd = forward_from_yaw(0.0);
        let right = right_from_yaw(0.0);
        assert_abs_diff_eq!(fwd.dot(&right), 0.0, epsilon = 1.0e-6);
        // Facing -Z, right is +X.
        assert_abs_diff_eq!(right.x, 1.0, epsilon = 1.0e-6);
    }

    #[test]
    fn lerp_angle_takes_short_way_around() {
        // 170deg -> -170deg should pass through 180, not 0.
        let a = 170.0_f32.to_radians();
        let b = (-170.0_f32).to_radians();
        let mid = lerp_angle(a, b, 0.5);
        assert_abs_diff_eq!(mid.abs(), PI, epsilon = 1.0e-4);
    }

    #[test]
    fn approach_angle_clamps_step() {
        let next = approach_angle(0.0, 1.0, 0.25);
        assert_abs_diff_eq!(next, 0.25, epsilon = 1.0e-6);
        let done = approach_angle(0.0, 0.1, 0.25);
        assert_abs_diff_eq!(done, 0.1, epsilon = 1.0e-6);
    }
}
