use std::time::Duration;

/// Fixed simulation rate shared by client prediction and server validation.
pub const TICK_HZ: u32 = 60;

/// Duration of one fixed tick.
pub const FIXED_TICK: Duration = Duration::from_micros(1_000_000 / TICK_HZ as u64);

/// Duration of one fixed tick in seconds. Every simulation call on both sides uses it.
pub const FIXED_DT: f32 = 1.0 / TICK_HZ as f32;

/// Practical small distance for comparisons (meters).
/// Use for dot-product guards, equality checks in world space, etc.
pub const DIST_EPS: f32 = 1.0e-6;

/// Minimum squared movement threshold to consider a sweep meaningful (m^2).
/// Movements below this are treated as zero to avoid tiny oscillations.
pub const MIN_MOVE_SQ: f32 = 1.0e-8;

/// Slack used when deciding whether a sweep fell short of the requested distance (meters).
pub const COLLIDE_EPS: f32 = 1.0e-3;

/// Minimum planar motion required to update yaw (meters per tick).
pub const YAW_EPS: f32 = 1.0e-6;

/// Normals whose vertical component is at or below this are treated as degenerate.
pub const MIN_NORMAL_Y: f32 = 1.0e-4;

/// Hard ceiling on substeps per simulation call, regardless of tick duration.
pub const MAX_SUBSTEPS: u32 = 8;

/// Maximum number of slide iterations per kinematic sweep.
/// Higher values help with tight corners at the cost of more queries.
pub const MAX_SLIDE_ITERATIONS: u32 = 4;
