use super::{
    TerrainQuery,
    types::{Point3, TerrainHit, Vec2, Vec3},
};
use crate::{
    DIST_EPS, MIN_NORMAL_Y,
    settings::{CapsuleSpec, SimulationConstants},
};

/// Ground found below a capsule.
#[derive(Clone, Copy, Debug)]
pub struct GroundProbe {
    pub hit: TerrainHit,
    /// Vertical gap between the capsule's feet and the surface (negative when the feet are
    /// below the surface).
    pub gap: f32,
}

impl GroundProbe {
    /// Capsule center height that rests on this ground with `skin` clearance along the
    /// surface normal.
    ///
    /// On a slope the lower sphere touches the surface away from the point below the center,
    /// so the clearance is measured along the normal, not vertically.
    #[inline]
    pub fn resting_center_y(&self, capsule: &CapsuleSpec, skin: f32) -> f32 {
        let ny = self.hit.normal.y;
        let clearance = if ny.is_finite() && ny > MIN_NORMAL_Y {
            (capsule.radius + skin) / ny
        } else {
            capsule.radius + skin
        };
        self.hit.point.y + capsule.half_height + clearance
    }

    /// How far a capsule centered at `center_y` floats above its resting height.
    #[inline]
    pub fn height_above_rest(&self, capsule: &CapsuleSpec, center_y: f32, skin: f32) -> f32 {
        center_y - self.resting_center_y(capsule, skin)
    }
}

/// Walkability verdict for a ground contact.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Walkability {
    Walkable,
    TooSteep,
    /// Missing, zero, non-finite or near-vertical normal. Never walkable.
    Degenerate,
}

impl Walkability {
    #[inline]
    pub fn is_walkable(self) -> bool {
        self == Walkability::Walkable
    }
}

/// Cast straight down from just above the capsule's feet.
///
/// The ray starts `lift` meters above the feet so that ground the capsule sank into slightly
/// is still found, and reaches `max_down` meters below them.
pub fn probe_ground<T: TerrainQuery + ?Sized>(
    terrain: &T,
    capsule: &CapsuleSpec,
    pos: Vec3,
    lift: f32,
    max_down: f32,
) -> Option<GroundProbe> {
    let lift = lift.max(0.0);
    let feet_y = pos.y - capsule.feet_offset();
    let origin = Point3::new(pos.x, feet_y + lift, pos.z);

    terrain
        .cast_ray(origin, -Vec3::y(), lift + max_down.max(0.0))
        .map(|hit| GroundProbe {
            hit,
            gap: hit.toi - lift,
        })
}

/// Classify a ground normal for a mover that just travelled `planar_delta` (XZ).
///
/// The implied rise over the actual horizontal displacement decides between the uphill and
/// downhill limits. Without meaningful displacement the surface's own steepness is held to
/// the (stricter) uphill limit.
pub fn classify_ground(
    normal: &Vec3,
    planar_delta: &Vec2,
    constants: &SimulationConstants,
) -> Walkability {
    let len = normal.norm();
    if !len.is_finite() || len <= DIST_EPS {
        return Walkability::Degenerate;
    }
    let n = normal / len;
    if n.y <= MIN_NORMAL_Y {
        return Walkability::Degenerate;
    }

    let run = planar_delta.norm();
    if run <= DIST_EPS {
        let steepness = n.y.clamp(-1.0, 1.0).acos();
        return if steepness <= constants.max_uphill_slope_rad() {
            Walkability::Walkable
        } else {
            Walkability::TooSteep
        };
    }

    // Height gained by moving `planar_delta` along the surface.
    let rise = -(n.x * planar_delta.x + n.z * planar_delta.y) / n.y;
    let angle = rise.atan2(run);

    let walkable = if angle >= 0.0 {
        angle <= constants.max_uphill_slope_rad()
    } else {
        -angle <= constants.max_downhill_slope_rad()
    };

    if walkable {
        Walkability::Walkable
    } else {
        Walkability::TooSteep
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::HalfSpaceTerrain;
    use approx::assert_abs_diff_eq;

    fn slope_normal(deg: f32) -> Vec3 {
        // Rises toward +X.
        let a = deg.to_radians();
        Vec3::new(-a.sin(), a.cos(), 0.0)
    }

    #[test]
    fn flat_ground_is_walkable_in_any_direction() {
        let c = SimulationConstants::default();
        assert!(classify_ground(&Vec3::y(), &Vec2::new(1.0, 0.0), &c).is_walkable());
        assert!(classify_ground(&Vec3::y(), &Vec2::zeros(), &c).is_walkable());
    }

    #[test]
    fn uphill_limit_is_stricter_than_downhill() {
        let c = SimulationConstants::default();
        let n = slope_normal(70.0);
        // Climbing a 70deg face is refused.
        assert_eq!(
            classify_ground(&n, &Vec2::new(0.1, 0.0), &c),
            Walkability::TooSteep
        );
        // Descending the same face stays within the 75deg downhill tolerance.
        assert!(classify_ground(&n, &Vec2::new(-0.1, 0.0), &c).is_walkable());
        // Steeper than both limits.
        let cliff = slope_normal(80.0);
        assert_eq!(
            classify_ground(&cliff, &Vec2::new(-0.1, 0.0), &c),
            Walkability::TooSteep
        );
    }

    #[test]
    fn moving_across_a_slope_is_flat() {
        let c = SimulationConstants::default();
        // Traversing perpendicular to the fall line has no rise at all.
        let n = slope_normal(65.0);
        assert!(classify_ground(&n, &Vec2::new(0.0, 1.0), &c).is_walkable());
    }

    #[test]
    fn degenerate_normals_are_not_walkable() {
        let c = SimulationConstants::default();
        let d = Vec2::new(1.0, 0.0);
        assert_eq!(classify_ground(&Vec3::zeros(), &d, &c), Walkability::Degenerate);
        assert_eq!(classify_ground(&Vec3::x(), &d, &c), Walkability::Degenerate);
        assert_eq!(
            classify_ground(&Vec3::new(f32::NAN, 1.0, 0.0), &d, &c),
            Walkability::Degenerate
        );
        assert_eq!(classify_ground(&-Vec3::y(), &d, &c), Walkability::Degenerate);
    }

    #[test]
    fn probe_reports_gap_below_feet() {
        let terrain = HalfSpaceTerrain::flat(0.0);
        let capsule = CapsuleSpec {
            radius: 0.5,
            half_height: 0.5,
        };
        let probe = probe_ground(&terrain, &capsule, Vec3::new(0.0, 1.1, 0.0), 0.25, 0.3).unwrap();
        assert_abs_diff_eq!(probe.gap, 0.1, epsilon = 1.0e-5);
        assert_abs_diff_eq!(probe.resting_center_y(&capsule, 0.02), 1.02, epsilon = 1.0e-5);
        assert_abs_diff_eq!(probe.height_above_rest(&capsule, 1.1, 0.02), 0.08, epsilon = 1.0e-5);

        assert!(probe_ground(&terrain, &capsule, Vec3::new(0.0, 2.0, 0.0), 0.25, 0.3).is_none());
    }

    #[test]
    fn resting_height_on_slope_clears_along_normal() {
        let terrain = HalfSpaceTerrain::ramp_x(60.0);
        let capsule = CapsuleSpec {
            radius: 0.5,
            half_height: 0.5,
        };
        let probe = probe_ground(&terrain, &capsule, Vec3::new(0.0, 3.0, 0.0), 0.25, 5.0).unwrap();
        let rest = probe.resting_center_y(&capsule, 0.0);
        // cos(60deg) = 0.5, so the sphere center sits 2r above the surface point.
        assert_abs_diff_eq!(rest, 0.5 + 1.0, epsilon = 1.0e-4);

        // Resting there, the capsule just touches the plane: a sweep into it hits immediately.
        let hit = terrain
            .sweep_capsule(&capsule, Vec3::new(0.0, rest, 0.0), Vec3::new(0.0, -0.1, 0.0))
            .unwrap();
        assert!(hit.fraction < 1.0e-3);
    }
}
