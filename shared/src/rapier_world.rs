//! Rapier-based terrain for immutable/static world geometry.
//!
//! Both server and client build the same in-memory Rapier scene from a set of static collider
//! definitions and query it through [`TerrainQuery`]. Nothing is ever stepped; only the
//! broad-phase BVH is built so that ray casts and capsule shape casts can run.
//!
//! Design goals
//! - Deterministic: given the same inputs (sorted by `id`), build identical in-memory sets.
//! - Query-focused: ray casts for ground probing, shape casts for sweep-and-slide.
//! - Immutable world: statics do not move after construction.

// Re-export Rapier so downstream crates can name Rapier types without depending on it directly.
pub use rapier3d;

use crate::{
    collision::{Point3, SweepHit, TerrainHit, TerrainQuery, Vec3},
    settings::CapsuleSpec,
};
use rapier3d::na::{DMatrix, Translation3, UnitQuaternion};
use rapier3d::parry::query::ShapeCastOptions;
use rapier3d::prelude::*;

/// Canonical, schema-agnostic definition of an immutable world collider.
///
/// Conventions
/// - Units are meters.
/// - Rotation is a unit quaternion.
/// - For planes, the normal is derived from the pose (`rotation * +Y`) and the surface sits
///   `offset_along_normal` away from the translation.
#[derive(Clone, Debug)]
pub struct WorldStaticDef {
    /// Stable unique identifier used to ensure deterministic insertion order.
    pub id: u64,
    /// World-space translation.
    pub translation: Vector<f32>,
    /// World-space rotation (unit quaternion).
    pub rotation: UnitQuaternion<f32>,
    /// Collider shape parameters.
    pub shape: ColliderShapeDef,
}

impl WorldStaticDef {
    /// Unrotated definition at `translation`.
    pub fn at(id: u64, translation: Vector<f32>, shape: ColliderShapeDef) -> Self {
        Self {
            id,
            translation,
            rotation: UnitQuaternion::identity(),
            shape,
        }
    }
}

/// Supported static collider shapes.
#[derive(Clone, Debug)]
pub enum ColliderShapeDef {
    /// Infinite plane (half-space), offset along its pose-derived normal.
    Plane { offset_along_normal: f32 },

    /// Oriented cuboid with given half-extents (meters).
    Cuboid { half_extents: Vector<f32> },

    /// Sphere/ball (meters).
    Sphere { radius: f32 },

    /// Y-aligned capsule (meters).
    CapsuleY { radius: f32, half_height: f32 },

    /// Y-aligned cylinder (meters).
    CylinderY { radius: f32, half_height: f32 },

    /// Regular height grid centered on the translation.
    ///
    /// `heights` is row-major with `rows * cols` entries; `scale` is the full extent of the
    /// field (x = width, y = height multiplier, z = depth).
    Heightfield {
        rows: usize,
        cols: usize,
        heights: Vec<f32>,
        scale: Vector<f32>,
    },
}

/// In-memory Rapier structures needed for scene queries against a static world.
pub struct RapierQueryWorld {
    bodies: RigidBodySet,
    colliders: ColliderSet,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
}

impl RapierQueryWorld {
    /// Build a query world from a list of static collider definitions.
    ///
    /// Definitions are inserted sorted by `id`. Malformed heightfields (height count not
    /// matching `rows * cols`) are skipped with a warning.
    pub fn build(mut defs: Vec<WorldStaticDef>) -> Self {
        defs.sort_by_key(|d| d.id);

        let bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();
        let mut modified_colliders = Vec::with_capacity(defs.len());

        for def in &defs {
            let Some(mut collider) = collider_from_def(def) else {
                log::warn!("Skipping malformed world static {}", def.id);
                continue;
            };
            collider.set_position(world_pose(def));
            modified_colliders.push(colliders.insert(collider));
        }

        let mut broad_phase = BroadPhaseBvh::new();
        let mut events = Vec::new();
        broad_phase.update(
            &IntegrationParameters::default(),
            &colliders,
            &bodies,
            &modified_colliders,
            &[],
            &mut events,
        );

        log::info!("Built static query world with {} colliders", colliders.len());

        Self {
            bodies,
            colliders,
            broad_phase,
            narrow_phase: NarrowPhase::default(),
        }
    }

    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    /// Create a borrowed `QueryPipeline` view for scene queries.
    pub fn query_pipeline<'a>(&'a self, filter: QueryFilter<'a>) -> QueryPipeline<'a> {
        self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            filter,
        )
    }
}

impl TerrainQuery for RapierQueryWorld {
    fn cast_ray(&self, origin: Point3, dir: Vec3, max_toi: f32) -> Option<TerrainHit> {
        let pipeline = self.query_pipeline(QueryFilter::default());
        let ray = Ray::new(origin, dir);

        pipeline
            .cast_ray_and_get_normal(&ray, max_toi.max(0.0), true)
            .map(|(_handle, hit)| TerrainHit {
                toi: hit.time_of_impact,
                point: ray.point_at(hit.time_of_impact),
                normal: hit.normal,
            })
    }

    fn sweep_capsule(
        &self,
        capsule: &CapsuleSpec,
        start: Vec3,
        translation: Vec3,
    ) -> Option<SweepHit> {
        let pipeline = self.query_pipeline(QueryFilter::default());
        let shape = Capsule::new_y(capsule.half_height, capsule.radius);
        let shape_pos = Isometry::translation(start.x, start.y, start.z);

        let mut options = ShapeCastOptions::with_max_time_of_impact(1.0);
        // Overlaps only block motion that goes deeper; resting contacts must not pin the capsule.
        options.stop_at_penetration = false;

        pipeline
            .cast_shape(&shape_pos, &translation, &shape, options)
            .map(|(_handle, hit)| {
                // normal1 points out of the capsule toward the obstacle; flip it so it opposes motion.
                let mut n = -hit.normal1.into_inner();
                if n.dot(&translation) > 0.0 {
                    n = -n;
                }
                SweepHit {
                    fraction: hit.time_of_impact,
                    normal: n,
                }
            })
    }
}

/// World pose of a static. Planes are shifted along their normal (`rotation * +Y`).
fn world_pose(def: &WorldStaticDef) -> Isometry<f32> {
    let mut translation = def.translation;
    if let ColliderShapeDef::Plane {
        offset_along_normal,
    } = def.shape
    {
        translation += (def.rotation * Vector::y()) * offset_along_normal;
    }
    Isometry::from_parts(Translation3::from(translation), def.rotation)
}

/// Build a Rapier collider (identity local transform) from a `WorldStaticDef`.
fn collider_from_def(def: &WorldStaticDef) -> Option<Collider> {
    let collider = match &def.shape {
        // The plane offset is folded into the pose by `world_pose`.
        ColliderShapeDef::Plane { .. } => ColliderBuilder::halfspace(Vector::y_axis()).build(),

        ColliderShapeDef::Cuboid { half_extents } => {
            ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z).build()
        }

        ColliderShapeDef::Sphere { radius } => ColliderBuilder::ball(*radius).build(),

        ColliderShapeDef::CapsuleY {
            radius,
            half_height,
        } => ColliderBuilder::capsule_y(*half_height, *radius).build(),

        ColliderShapeDef::CylinderY {
            radius,
            half_height,
        } => ColliderBuilder::cylinder(*half_height, *radius).build(),

        ColliderShapeDef::Heightfield {
            rows,
            cols,
            heights,
            scale,
        } => {
            if *rows < 2 || *cols < 2 || heights.len() != rows * cols {
                return None;
            }
            let matrix = DMatrix::from_row_slice(*rows, *cols, heights);
            ColliderBuilder::heightfield(matrix, *scale).build()
        }
    };

    Some(collider)
}
