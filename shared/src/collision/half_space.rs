use super::{
    TerrainQuery,
    types::{Point3, SweepHit, TerrainHit, Vec3},
};
use crate::{DIST_EPS, settings::CapsuleSpec};

/// Terrain made of infinite half-spaces, solved analytically.
///
/// Each entry is a plane `normal ⋅ x = dist`; the solid side is `normal ⋅ x <= dist`, so the
/// normal points out of the solid. The world is the union of all entries.
///
/// Cheap and exact, which makes it the terrain of choice for flat zones, headless servers and
/// tests. Real level geometry goes through [`crate::RapierQueryWorld`].
#[derive(Clone, Debug, Default)]
pub struct HalfSpaceTerrain {
    planes: Vec<(Vec3, f32)>,
}

impl HalfSpaceTerrain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flat ground with its surface at `height`.
    pub fn flat(height: f32) -> Self {
        Self::new().with_plane(Vec3::y(), height)
    }

    /// Add a plane. The normal is normalized; a zero normal is ignored.
    pub fn with_plane(mut self, normal: Vec3, dist: f32) -> Self {
        let len = normal.norm();
        if len > DIST_EPS {
            self.planes.push((normal / len, dist / len));
        }
        self
    }

    /// Alias of [`Self::with_plane`] that reads better for vertical planes.
    pub fn with_wall(self, normal: Vec3, dist: f32) -> Self {
        self.with_plane(normal, dist)
    }

    /// Ground inclined by `angle_deg` that rises toward +X and passes through the origin.
    pub fn ramp_x(angle_deg: f32) -> Self {
        let a = angle_deg.to_radians();
        Self::new().with_plane(Vec3::new(-a.sin(), a.cos(), 0.0), 0.0)
    }

    pub fn planes(&self) -> &[(Vec3, f32)] {
        &self.planes
    }
}

impl TerrainQuery for HalfSpaceTerrain {
    fn cast_ray(&self, origin: Point3, dir: Vec3, max_toi: f32) -> Option<TerrainHit> {
        let mut best: Option<TerrainHit> = None;

        for &(n, d) in &self.planes {
            let s = n.dot(&origin.coords) - d;
            if s < 0.0 {
                // Starting inside solid: immediate hit without a usable normal.
                return Some(TerrainHit {
                    toi: 0.0,
                    point: origin,
                    normal: Vec3::zeros(),
                });
            }

            let denom = n.dot(&dir);
            if denom >= -DIST_EPS {
                continue;
            }

            let toi = s / -denom;
            if toi > max_toi {
                continue;
            }
            if best.as_ref().map_or(true, |b| toi < b.toi) {
                best = Some(TerrainHit {
                    toi,
                    point: origin + dir * toi,
                    normal: n,
                });
            }
        }

        best
    }

    fn sweep_capsule(
        &self,
        capsule: &CapsuleSpec,
        start: Vec3,
        translation: Vec3,
    ) -> Option<SweepHit> {
        let mut best: Option<SweepHit> = None;

        for &(n, d) in &self.planes {
            let denom = n.dot(&translation);
            if denom >= -DIST_EPS {
                // Parallel or moving away.
                continue;
            }

            // Support distance of a Y-aligned capsule along the plane normal.
            let reach = capsule.radius + capsule.half_height * n.y.abs();
            let gap = n.dot(&start) - d - reach;
            let fraction = (gap / -denom).max(0.0);
            if fraction > 1.0 {
                continue;
            }
            if best.map_or(true, |b| fraction < b.fraction) {
                best = Some(SweepHit {
                    fraction,
                    normal: n,
                });
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn ray_down_hits_flat_ground() {
        let terrain = HalfSpaceTerrain::flat(1.0);
        let hit = terrain
            .cast_ray(Point3::new(3.0, 4.0, -2.0), -Vec3::y(), 10.0)
            .unwrap();
        assert_abs_diff_eq!(hit.toi, 3.0, epsilon = 1.0e-6);
        assert_abs_diff_eq!(hit.point.y, 1.0, epsilon = 1.0e-6);
        assert_abs_diff_eq!(hit.normal, Vec3::y(), epsilon = 1.0e-6);
    }

    #[test]
    fn ray_respects_max_toi() {
        let terrain = HalfSpaceTerrain::flat(0.0);
        assert!(terrain.cast_ray(Point3::new(0.0, 5.0, 0.0), -Vec3::y(), 4.0).is_none());
    }

    #[test]
    fn ray_starting_inside_has_degenerate_normal() {
        let terrain = HalfSpaceTerrain::flat(0.0);
        let hit = terrain
            .cast_ray(Point3::new(0.0, -1.0, 0.0), -Vec3::y(), 4.0)
            .unwrap();
        assert_eq!(hit.toi, 0.0);
        assert_eq!(hit.normal, Vec3::zeros());
    }

    #[test]
    fn ramp_normal_tilts_against_rise() {
        let terrain = HalfSpaceTerrain::ramp_x(30.0);
        let hit = terrain
            .cast_ray(Point3::new(2.0, 5.0, 0.0), -Vec3::y(), 10.0)
            .unwrap();
        // Surface height at x=2 is 2*tan(30deg).
        assert_abs_diff_eq!(hit.point.y, 2.0 * 30.0_f32.to_radians().tan(), epsilon = 1.0e-5);
        assert!(hit.normal.x < 0.0);
    }

    #[test]
    fn capsule_sweep_lands_on_ground() {
        let terrain = HalfSpaceTerrain::flat(0.0);
        let capsule = CapsuleSpec {
            radius: 0.5,
            half_height: 0.5,
        };
        // Feet at y=1, falling 2m: touches after half the motion.
        let hit = terrain
            .sweep_capsule(&capsule, Vec3::new(0.0, 2.0, 0.0), Vec3::new(0.0, -2.0, 0.0))
            .unwrap();
        assert_abs_diff_eq!(hit.fraction, 0.5, epsilon = 1.0e-6);
        assert_abs_diff_eq!(hit.normal, Vec3::y(), epsilon = 1.0e-6);

        // Moving up never hits the ground.
        assert!(
            terrain
                .sweep_capsule(&capsule, Vec3::new(0.0, 2.0, 0.0), Vec3::new(0.0, 2.0, 0.0))
                .is_none()
        );
    }
}
