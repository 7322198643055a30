//! One deterministic character-movement step, shared by client prediction and server
//! validation.
//!
//! The simulator only reads terrain. Both sides must call [`CollisionSimulator::step`] with the
//! same capsule, constants and terrain to agree on the outcome.

use crate::{
    COLLIDE_EPS, DIST_EPS, MAX_SUBSTEPS, MIN_MOVE_SQ, MIN_NORMAL_Y,
    collision::{
        GroundProbe, TerrainQuery, Vec2, Vec3, classify_ground, probe_ground, sweep_and_slide,
    },
    settings::{CapsuleSpec, SimulationConstants},
    utils::yaw_from_xz,
};

/// Inputs of one simulation step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepInput {
    /// Capsule center (world space).
    pub position: Vec3,
    /// Planar (XZ) direction. Normalized when longer than 1.
    pub direction: Vec2,
    /// Tick duration in seconds.
    pub dt: f32,
    /// Horizontal speed (m/s).
    pub speed: f32,
    pub velocity_y: f32,
    pub grounded: bool,
    pub jump_pressed: bool,
}

/// Requested vs. achieved horizontal distance over a step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionInfo {
    pub requested: f32,
    pub actual: f32,
    /// `actual / requested`, in `[0, 1]` barring float noise.
    pub ratio: f32,
    pub collided: bool,
}

/// Result of one simulation step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepOutput {
    pub position: Vec3,
    pub velocity_y: f32,
    pub grounded: bool,
    /// A jump was started by this step.
    pub jumped: bool,
    /// `None` when no horizontal motion was requested.
    pub collision: Option<CollisionInfo>,
    /// Yaw of the requested planar direction, if any.
    pub movement_yaw: Option<f32>,
}

impl StepOutput {
    fn unchanged(input: &StepInput) -> Self {
        Self {
            position: input.position,
            velocity_y: input.velocity_y,
            grounded: input.grounded,
            jumped: false,
            collision: None,
            movement_yaw: None,
        }
    }
}

/// Capsule controller against static terrain.
///
/// Holds the capsule used for every sweep and ground probe; nothing else persists between
/// calls.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CollisionSimulator {
    capsule: CapsuleSpec,
}

impl CollisionSimulator {
    pub fn new(capsule: CapsuleSpec) -> Self {
        Self { capsule }
    }

    pub fn capsule(&self) -> &CapsuleSpec {
        &self.capsule
    }

    /// Advance a character by one tick.
    ///
    /// Behavior
    /// - A grounded jump sets the jump impulse and leaves the ground immediately.
    /// - The tick is split into substeps no longer than `max_substep_s` (at most `MAX_SUBSTEPS`).
    /// - Each substep sweeps horizontally (following walkable ground), probes for ground,
    ///   then integrates gravity and sweeps vertically when airborne.
    /// - A zero direction while grounded and not jumping returns the input unchanged.
    pub fn step<T: TerrainQuery + ?Sized>(
        &self,
        terrain: &T,
        input: &StepInput,
        constants: &SimulationConstants,
    ) -> StepOutput {
        if !input_is_finite(input) || input.dt <= 0.0 {
            return StepOutput::unchanged(input);
        }

        let len = input.direction.norm();
        let moving = len > DIST_EPS;
        let direction = if !moving {
            Vec2::zeros()
        } else if len > 1.0 {
            input.direction / len
        } else {
            input.direction
        };

        if !moving && input.grounded && !input.jump_pressed {
            return StepOutput::unchanged(input);
        }

        let c = constants;
        let skin = c.skin.max(0.0);
        let speed = input.speed.max(0.0);

        let mut pos = input.position;
        let mut vy = input.velocity_y;
        let mut grounded = input.grounded;
        let mut jumped = false;

        // 1) Jump.
        if input.jump_pressed && grounded {
            vy = c.jump_impulse_mps;
            grounded = false;
            jumped = true;
        }

        // 2) Substeps.
        let substeps = substep_count(input.dt, c.max_substep_s);
        let sub_dt = input.dt / substeps as f32;

        let mut requested = 0.0_f32;
        let mut actual = 0.0_f32;

        for _ in 0..substeps {
            // 3a) Horizontal sweep. Grounded movers follow the surface they stand on.
            let control = if grounded {
                1.0
            } else {
                c.air_control.clamp(0.0, 1.0)
            };
            let planar = direction * (speed * control * sub_dt);
            let before = pos;

            if planar.norm_squared() > MIN_MOVE_SQ {
                requested += planar.norm();
                let support = if grounded {
                    self.ground_below(terrain, pos, c)
                } else {
                    None
                };
                let translation = self.surface_translation(&planar, support.as_ref(), c);
                pos = sweep_and_slide(terrain, &self.capsule, pos, translation, skin).end_pos;
            }

            let planar_delta = Vec2::new(pos.x - before.x, pos.z - before.z);
            actual += planar_delta.norm();

            // 3b) Ground under the new horizontal position.
            let ground = self
                .ground_below(terrain, pos, c)
                .filter(|g| classify_ground(&g.hit.normal, &planar_delta, c).is_walkable());

            // Strict slope: climbing onto something that is not walkable uphill gains nothing.
            if pos.y > before.y + DIST_EPS && ground.is_none() {
                pos.y = before.y;
            }

            if grounded {
                match ground {
                    Some(g)
                        if g.height_above_rest(&self.capsule, pos.y, skin)
                            <= c.ground_snap_distance =>
                    {
                        pos.y = g.resting_center_y(&self.capsule, skin);
                        vy = c.ground_stick_velocity_mps;
                        continue;
                    }
                    _ => grounded = false,
                }
            }

            // 3c) Asymmetric gravity.
            let scale = if vy > 0.0 {
                c.rise_gravity_scale
            } else {
                c.fall_gravity_scale
            };
            vy -= c.gravity_mps2 * scale * sub_dt;
            vy = vy.max(-c.max_fall_speed_mps.abs());

            // 3d) Vertical sweep.
            let dy = vy * sub_dt;
            let slide = sweep_and_slide(terrain, &self.capsule, pos, Vec3::new(0.0, dy, 0.0), skin);
            pos = slide.end_pos;

            if let Some(hit) = slide.last_hit {
                if dy > 0.0 {
                    // Blocked from above.
                    vy = vy.min(0.0);
                } else if classify_ground(&hit.normal, &planar_delta, c).is_walkable() {
                    grounded = true;
                }
            }

            // Landing within tolerance also counts, even without a sweep contact.
            if vy <= 0.0 {
                let landing = self.ground_below(terrain, pos, c).filter(|g| {
                    g.height_above_rest(&self.capsule, pos.y, skin) <= c.landing_tolerance
                        && classify_ground(&g.hit.normal, &planar_delta, c).is_walkable()
                });
                if let Some(g) = landing {
                    pos.y = g.resting_center_y(&self.capsule, skin);
                    grounded = true;
                }
            }

            if grounded {
                vy = c.ground_stick_velocity_mps;
            }
        }

        let collision = (requested > 0.0).then(|| CollisionInfo {
            requested,
            actual,
            ratio: (actual / requested).max(0.0),
            collided: actual + COLLIDE_EPS < requested,
        });

        StepOutput {
            position: pos,
            velocity_y: vy,
            grounded,
            jumped,
            collision,
            movement_yaw: if moving { yaw_from_xz(&direction) } else { None },
        }
    }

    /// Downward probe long enough to reach the resting surface on the steepest walkable slope
    /// plus the snap distance.
    fn ground_below<T: TerrainQuery + ?Sized>(
        &self,
        terrain: &T,
        pos: Vec3,
        c: &SimulationConstants,
    ) -> Option<GroundProbe> {
        let steepest = c.max_uphill_slope_rad().max(c.max_downhill_slope_rad());
        let cos = steepest.cos().max(MIN_NORMAL_Y);
        let clearance = (self.capsule.radius + c.skin.max(0.0)) / cos - self.capsule.radius;
        let reach = c.ground_snap_distance.max(c.landing_tolerance).max(0.0) + clearance;

        probe_ground(terrain, &self.capsule, pos, c.probe_lift, reach)
    }

    /// Lift a planar move onto the supporting surface when it is walkable in that direction.
    /// The planar length is preserved so slopes do not slow the mover down.
    fn surface_translation(
        &self,
        planar: &Vec2,
        support: Option<&GroundProbe>,
        c: &SimulationConstants,
    ) -> Vec3 {
        let flat = Vec3::new(planar.x, 0.0, planar.y);
        let Some(g) = support else {
            return flat;
        };

        let n = g.hit.normal;
        if !classify_ground(&n, planar, c).is_walkable() || n.y <= MIN_NORMAL_Y {
            return flat;
        }
        let rise = -(n.x * planar.x + n.z * planar.y) / n.y;
        Vec3::new(planar.x, rise, planar.y)
    }
}

fn input_is_finite(input: &StepInput) -> bool {
    input.position.iter().all(|v| v.is_finite())
        && input.direction.iter().all(|v| v.is_finite())
        && input.dt.is_finite()
        && input.speed.is_finite()
        && input.velocity_y.is_finite()
}

fn substep_count(dt: f32, max_substep: f32) -> u32 {
    if max_substep.is_nan() || max_substep <= 0.0 {
        return 1;
    }
    // Absorb float noise so that e.g. 1/60 over 1/120 yields exactly two substeps.
    let n = (dt / max_substep - 1.0e-3).ceil();
    if !n.is_finite() {
        return MAX_SUBSTEPS;
    }
    (n as u32).clamp(1, MAX_SUBSTEPS)
}
