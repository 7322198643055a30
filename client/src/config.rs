use serde::{Deserialize, Serialize};
use shared::{MovementSettings, SettingsError, load_ron_file};
use std::path::Path;

/// Prediction and reconciliation tunables for the local mover.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientMovementConfig {
    /// Pending (unacknowledged) moves kept for replay. Overflow drops the oldest.
    pub buffer_capacity: usize,
    /// Horizontal reconcile delta that forces a hard snap (meters).
    pub reconcile_horizontal_epsilon: f32,
    /// Vertical reconcile delta that forces a hard snap while grounded (meters).
    pub grounded_vertical_tolerance: f32,
    /// Vertical reconcile delta that forces a hard snap while airborne (meters).
    pub airborne_vertical_tolerance: f32,
    /// Idle time before rendered/authoritative drift is snapped away (seconds).
    pub idle_snap_delay_s: f32,
    /// Drift below this is left alone while idle (meters).
    pub idle_drift_epsilon: f32,
    /// How fast facing turns toward the movement direction (radians per second).
    pub turn_rate_rad_s: f32,
    /// Diagnostic: compute reconcile deltas but never apply them.
    pub ignore_server_corrections: bool,
}

impl Default for ClientMovementConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: 128,
            reconcile_horizontal_epsilon: 0.05,
            grounded_vertical_tolerance: 0.05,
            airborne_vertical_tolerance: 0.5,
            idle_snap_delay_s: 0.25,
            idle_drift_epsilon: 0.01,
            turn_rate_rad_s: 12.0,
            ignore_server_corrections: false,
        }
    }
}

/// Remote-entity smoothing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpolationConfig {
    /// Remote entities render this far in the past (milliseconds).
    pub delay_ms: u64,
    /// Samples older than `render time - retention` are dropped (milliseconds).
    pub retention_ms: u64,
    /// Whether newly seen entities are interpolated.
    pub enabled_by_default: bool,
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            delay_ms: 100,
            retention_ms: 1_000,
            enabled_by_default: true,
        }
    }
}

/// Client-side configuration document. Shares `movement` with the server's.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub movement: MovementSettings,
    pub controller: ClientMovementConfig,
    pub interpolation: InterpolationConfig,
}

impl ClientConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        load_ron_file(path)
    }
}
