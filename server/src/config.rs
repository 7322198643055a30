use serde::{Deserialize, Serialize};
use shared::{MovementSettings, SettingsError, load_ron_file};
use std::path::Path;

/// Per-connection validation tunables.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Bounded queue of admitted moves awaiting simulation. Overflow drops the oldest.
    pub queue_capacity: usize,
    /// Moves added to a connection's budget every authoritative tick.
    pub inputs_per_tick: u32,
    /// Ceiling on the accumulated budget (moves simulated in one tick at most).
    pub max_input_burst: u32,
    /// Largest accepted distance between predicted and authoritative position (meters).
    pub acceptance_distance: f32,
    /// While snap-locked, a reported position this close to the target releases the lock.
    pub unlock_radius: f32,
    /// Broadcast a snapshot of every connection each N ticks.
    pub snapshot_interval_ticks: u32,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            inputs_per_tick: 2,
            max_input_burst: 8,
            acceptance_distance: 0.5,
            unlock_radius: 0.35,
            snapshot_interval_ticks: 3,
        }
    }
}

/// Server-side configuration document.
///
/// Unknown sections are ignored, so the server and client can read the same file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub movement: MovementSettings,
    pub validator: ValidatorConfig,
}

impl ServerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        load_ron_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::from_ron_str;

    #[test]
    fn reads_validator_section_and_ignores_client_sections() {
        let config: ServerConfig = from_ron_str(
            "(validator: (acceptance_distance: 0.25), interpolation: (delay_ms: 100))",
        )
        .unwrap();
        assert_eq!(config.validator.acceptance_distance, 0.25);
        assert_eq!(config.validator.queue_capacity, 64);
        assert_eq!(config.movement, MovementSettings::default());
    }

    #[test]
    fn sample_config_parses() {
        let config: ServerConfig =
            from_ron_str(include_str!("../../config/movement.ron")).unwrap();
        assert_eq!(config.validator, ValidatorConfig::default());
        // Bit-identical to what a client running on defaults simulates with.
        assert_eq!(config.movement, MovementSettings::default());
    }
}
