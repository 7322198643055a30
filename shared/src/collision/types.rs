/*!
Core collision types and math aliases shared by the collision submodules.

This module intentionally contains no algorithms. It defines the data types exchanged
between terrain query backends (rapier world, analytic half-spaces), the sweep-and-slide
helper, ground probing, and the simulator.
*/

use nalgebra as na;

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type Vec2 = na::Vector2<f32>;
pub type Point3 = na::Point3<f32>;
pub type Iso = na::Isometry3<f32>;

/// A ray intersection against static terrain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainHit {
    /// Distance along the (unit) ray direction.
    pub toi: f32,
    /// World-space hit point.
    pub point: Point3,
    /// World-space surface normal. May be zero when the ray starts inside geometry.
    pub normal: Vec3,
}

/// First contact of a swept capsule.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SweepHit {
    /// Fraction (0..1) of the tested translation where the hit occurred.
    pub fraction: f32,
    /// World-space contact normal, oriented against the motion.
    pub normal: Vec3,
}

/// Result of a sweep-and-slide move.
#[derive(Clone, Copy, Debug)]
pub struct SlideResult {
    /// Final capsule center after applying the move and sliding.
    pub end_pos: Vec3,
    /// The last contact encountered (if any).
    pub last_hit: Option<SweepHit>,
}
