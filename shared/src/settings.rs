/*!
Simulation settings and tolerances.

These structs centralize the parameters used by the collision simulator: capsule shape,
gravity and jump tuning, slope limits, and ground snapping. Client prediction and server
validation must run with identical values, so they are passed explicitly into every
simulation call rather than read from globals.

Notes
- Distances are in meters, time in seconds, angles in degrees.
- Every struct is `#[serde(default)]`, so a RON document only needs the fields it overrides.
*/

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings document: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

/// Parse a RON settings document.
pub fn from_ron_str<T: DeserializeOwned>(text: &str) -> Result<T, SettingsError> {
    Ok(ron::from_str(text)?)
}

/// Read and parse a RON settings file.
pub fn load_ron_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, SettingsError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.display().to_string(),
        source,
    })?;
    from_ron_str(&text)
}

/// Capsule specification for the character controller.
///
/// half_height is the half-length of the cylinder section (aligned with +Y),
/// so the total capsule height is 2*half_height + 2*radius.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapsuleSpec {
    pub radius: f32,
    pub half_height: f32,
}

impl CapsuleSpec {
    /// Distance from the capsule center down to its lowest point.
    #[inline]
    pub fn feet_offset(&self) -> f32 {
        self.half_height + self.radius
    }
}

impl Default for CapsuleSpec {
    fn default() -> Self {
        Self {
            radius: 0.3,
            half_height: 0.6,
        }
    }
}

/// Horizontal speeds (meters per second).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementSpeeds {
    pub walk_mps: f32,
    pub sprint_mps: f32,
}

impl MovementSpeeds {
    #[inline]
    pub fn for_input(&self, is_sprinting: bool) -> f32 {
        if is_sprinting {
            self.sprint_mps
        } else {
            self.walk_mps
        }
    }
}

impl Default for MovementSpeeds {
    fn default() -> Self {
        Self {
            walk_mps: 5.0,
            sprint_mps: 8.0,
        }
    }
}

/// Constants for one simulation step.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConstants {
    /// Gravity magnitude (m/s^2, positive).
    pub gravity_mps2: f32,
    /// Gravity multiplier while moving up. Larger than `fall_gravity_scale` for a snappy arc.
    pub rise_gravity_scale: f32,
    /// Gravity multiplier while falling.
    pub fall_gravity_scale: f32,
    /// Terminal fall speed (m/s, positive magnitude).
    pub max_fall_speed_mps: f32,
    /// Vertical velocity applied on jump (m/s).
    pub jump_impulse_mps: f32,
    /// Small downward velocity held while grounded (m/s, negative).
    pub ground_stick_velocity_mps: f32,
    /// Planar control while airborne: 1.0 = full ground control, 0.0 = none.
    pub air_control: f32,
    /// Upper bound on one substep's duration (seconds).
    pub max_substep_s: f32,
    /// Steepest walkable uphill angle (degrees).
    pub max_uphill_slope_deg: f32,
    /// Steepest walkable downhill angle (degrees).
    pub max_downhill_slope_deg: f32,
    /// Separation kept from surfaces when landing or sliding (meters).
    pub skin: f32,
    /// How far below the feet grounded movers stay glued to walkable ground (meters).
    pub ground_snap_distance: f32,
    /// Gap below the feet at which an airborne mover counts as landed (meters).
    pub landing_tolerance: f32,
    /// Height above the feet where the ground ray starts (meters).
    pub probe_lift: f32,
}

impl SimulationConstants {
    #[inline]
    pub fn max_uphill_slope_rad(&self) -> f32 {
        self.max_uphill_slope_deg.to_radians()
    }

    #[inline]
    pub fn max_downhill_slope_rad(&self) -> f32 {
        self.max_downhill_slope_deg.to_radians()
    }
}

impl Default for SimulationConstants {
    fn default() -> Self {
        Self {
            gravity_mps2: 20.0,
            rise_gravity_scale: 1.25,
            fall_gravity_scale: 0.85,
            max_fall_speed_mps: 30.0,
            jump_impulse_mps: 7.5,
            ground_stick_velocity_mps: -0.5,
            air_control: 0.4,
            max_substep_s: 1.0 / 120.0,
            max_uphill_slope_deg: 60.0,
            max_downhill_slope_deg: 75.0,
            skin: 0.02,
            ground_snap_distance: 0.3,
            landing_tolerance: 0.05,
            probe_lift: 0.25,
        }
    }
}

/// Everything one side needs to run the simulator for a character.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementSettings {
    pub capsule: CapsuleSpec,
    pub speeds: MovementSpeeds,
    pub constants: SimulationConstants,
}
