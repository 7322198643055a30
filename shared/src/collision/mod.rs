/*!
Collision root module.

Static-world collision for the character controller. Backends implement [`TerrainQuery`];
everything above it (sweep-and-slide, ground probing, the simulator) is backend-agnostic.

- types:      shared data types (TerrainHit, SweepHit, math aliases)
- kinematic:  sweep-and-slide over a `TerrainQuery`
- ground:     downward probe and slope walkability
- half_space: analytic terrain made of infinite half-spaces
*/

pub mod ground;
pub mod half_space;
pub mod kinematic;
pub mod types;

pub use ground::{GroundProbe, Walkability, classify_ground, probe_ground};
pub use half_space::HalfSpaceTerrain;
pub use kinematic::sweep_and_slide;
pub use types::{Iso, Point3, SlideResult, SweepHit, TerrainHit, Vec2, Vec3};

use crate::settings::CapsuleSpec;

/// Read-only collision queries against static world geometry.
///
/// Implementations must be deterministic: identical queries return identical answers, which
/// is what lets the server re-simulate a client's inputs and land on the same result.
pub trait TerrainQuery {
    /// Cast a ray from `origin` along the unit vector `dir`, up to `max_toi` meters.
    fn cast_ray(&self, origin: Point3, dir: Vec3, max_toi: f32) -> Option<TerrainHit>;

    /// Sweep a Y-aligned capsule centered at `start` along `translation`.
    ///
    /// Returns the earliest contact. Shapes the capsule already overlaps only count when the
    /// motion pushes further into them.
    fn sweep_capsule(
        &self,
        capsule: &CapsuleSpec,
        start: Vec3,
        translation: Vec3,
    ) -> Option<SweepHit>;
}

impl<T: TerrainQuery + ?Sized> TerrainQuery for &T {
    fn cast_ray(&self, origin: Point3, dir: Vec3, max_toi: f32) -> Option<TerrainHit> {
        (**self).cast_ray(origin, dir, max_toi)
    }

    fn sweep_capsule(
        &self,
        capsule: &CapsuleSpec,
        start: Vec3,
        translation: Vec3,
    ) -> Option<SweepHit> {
        (**self).sweep_capsule(capsule, start, translation)
    }
}
