//! Time-delayed interpolation of other entities' poses.
//!
//! Remote entities are drawn `delay_ms` in the past so that there are usually two samples to
//! blend between. Sample times and `now_ms` must be in the same clock domain; hosts that feed
//! server timestamps are expected to offset their local clock accordingly.

use crate::config::InterpolationConfig;
use shared::{AuthoritativeSnapshot, Vec3, lerp_angle};
use std::collections::{HashMap, VecDeque};

/// One received pose of a remote entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RemotePoseSample {
    pub time_ms: u64,
    pub position: Vec3,
    pub facing_yaw: f32,
}

impl From<&AuthoritativeSnapshot> for RemotePoseSample {
    fn from(s: &AuthoritativeSnapshot) -> Self {
        Self {
            time_ms: s.server_time_ms,
            position: s.position(),
            facing_yaw: s.facing_yaw,
        }
    }
}

/// Pose to render.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RemotePose {
    pub position: Vec3,
    pub facing_yaw: f32,
}

impl From<&RemotePoseSample> for RemotePose {
    fn from(s: &RemotePoseSample) -> Self {
        Self {
            position: s.position,
            facing_yaw: s.facing_yaw,
        }
    }
}

#[derive(Debug)]
struct EntityTimeline {
    samples: VecDeque<RemotePoseSample>,
    enabled: bool,
}

impl EntityTimeline {
    fn new(enabled: bool) -> Self {
        Self {
            samples: VecDeque::new(),
            enabled,
        }
    }

    fn prune_before(&mut self, cutoff: u64) {
        while self.samples.front().is_some_and(|s| s.time_ms < cutoff) {
            self.samples.pop_front();
        }
    }
}

#[derive(Debug)]
pub struct RemoteInterpolationController {
    config: InterpolationConfig,
    entities: HashMap<u64, EntityTimeline>,
}

impl RemoteInterpolationController {
    pub fn new(config: InterpolationConfig) -> Self {
        Self {
            config,
            entities: HashMap::new(),
        }
    }

    pub fn config(&self) -> &InterpolationConfig {
        &self.config
    }

    /// Append a sample. Samples not newer than the latest one are discarded.
    ///
    /// Samples that no render time at or after this one could still use are pruned, so
    /// timelines stay bounded even when nobody samples them.
    pub fn push_sample(&mut self, entity: u64, sample: RemotePoseSample) -> bool {
        if !sample.position.iter().all(|v| v.is_finite()) || !sample.facing_yaw.is_finite() {
            log::warn!("Dropped non-finite pose for entity {entity}");
            return false;
        }

        let enabled = self.config.enabled_by_default;
        let timeline = self
            .entities
            .entry(entity)
            .or_insert_with(|| EntityTimeline::new(enabled));

        if timeline
            .samples
            .back()
            .is_some_and(|last| sample.time_ms <= last.time_ms)
        {
            log::trace!(
                "Dropped out-of-order pose for entity {entity} at {}ms",
                sample.time_ms
            );
            return false;
        }

        timeline.samples.push_back(sample);
        timeline.prune_before(
            sample
                .time_ms
                .saturating_sub(self.config.delay_ms)
                .saturating_sub(self.config.retention_ms),
        );
        true
    }

    /// Append the pose carried by a snapshot, keyed by its entity id.
    pub fn push_snapshot(&mut self, snapshot: &AuthoritativeSnapshot) -> bool {
        self.push_sample(snapshot.entity_id, snapshot.into())
    }

    /// Enable or disable interpolation for `entity`. Applies to samples that have not
    /// arrived yet, so the local entity can be disabled at spawn.
    pub fn set_enabled(&mut self, entity: u64, enabled: bool) {
        self.entities
            .entry(entity)
            .or_insert_with(|| EntityTimeline::new(enabled))
            .enabled = enabled;
    }

    /// Forget an entity and its samples.
    pub fn remove(&mut self, entity: u64) -> bool {
        self.entities.remove(&entity).is_some()
    }

    pub fn sample_count(&self, entity: u64) -> usize {
        self.entities.get(&entity).map_or(0, |t| t.samples.len())
    }

    /// Interpolated pose of `entity` for a frame rendered at `now_ms`.
    ///
    /// Prunes samples that fell out of the retention window. Returns `None` when the entity is
    /// unknown, disabled, or has no samples left.
    pub fn pose_at(&mut self, entity: u64, now_ms: u64) -> Option<RemotePose> {
        let timeline = self.entities.get_mut(&entity)?;
        let render_time = now_ms.saturating_sub(self.config.delay_ms);
        timeline.prune_before(render_time.saturating_sub(self.config.retention_ms));
        if !timeline.enabled {
            return None;
        }

        let samples = &timeline.samples;
        let (first, last) = (samples.front()?, samples.back()?);
        if render_time >= last.time_ms {
            return Some(last.into());
        }
        if render_time <= first.time_ms {
            return Some(first.into());
        }

        // First sample strictly newer than the render time; the one before it brackets from below.
        let upper = samples.partition_point(|s| s.time_ms <= render_time);
        let (a, b) = (&samples[upper - 1], &samples[upper]);
        let t = (render_time - a.time_ms) as f32 / (b.time_ms - a.time_ms) as f32;

        Some(RemotePose {
            position: a.position.lerp(&b.position, t),
            facing_yaw: lerp_angle(a.facing_yaw, b.facing_yaw, t),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sample(time_ms: u64, x: f32) -> RemotePoseSample {
        RemotePoseSample {
            time_ms,
            position: Vec3::new(x, 0.0, 0.0),
            facing_yaw: 0.0,
        }
    }

    fn controller(delay_ms: u64, retention_ms: u64) -> RemoteInterpolationController {
        RemoteInterpolationController::new(InterpolationConfig {
            delay_ms,
            retention_ms,
            enabled_by_default: true,
        })
    }

    #[test]
    fn blends_between_bracketing_samples() {
        let mut interp = controller(100, 1_000);
        interp.push_sample(1, sample(0, 0.0));
        interp.push_sample(1, sample(100, 10.0));

        let pose = interp.pose_at(1, 150).unwrap();
        assert_abs_diff_eq!(pose.position.x, 5.0, epsilon = 1.0e-4);
    }

    #[test]
    fn render_time_past_newest_returns_newest() {
        let mut interp = controller(100, 1_000);
        interp.push_sample(1, sample(0, 0.0));
        interp.push_sample(1, sample(100, 10.0));

        assert_eq!(interp.pose_at(1, 900).unwrap().position.x, 10.0);
    }

    #[test]
    fn render_time_before_oldest_returns_oldest() {
        let mut interp = controller(100, 1_000);
        interp.push_sample(1, sample(500, 3.0));
        interp.push_sample(1, sample(600, 4.0));

        assert_eq!(interp.pose_at(1, 200).unwrap().position.x, 3.0);
    }

    #[test]
    fn stale_samples_stop_influencing_the_pose() {
        let mut interp = controller(100, 500);
        interp.push_sample(1, sample(0, 0.0));
        interp.push_sample(1, sample(100, 10.0));
        interp.push_sample(1, sample(2_000, 20.0));
        interp.push_sample(1, sample(2_100, 30.0));

        // Render time 1600: the two old samples are past retention and get pruned, so the
        // pose clamps to the oldest remaining sample instead of blending 10 -> 20.
        let pose = interp.pose_at(1, 1_700).unwrap();
        assert_eq!(pose.position.x, 20.0);
        assert_eq!(interp.sample_count(1), 2);

        let pose = interp.pose_at(1, 2_150).unwrap();
        assert_abs_diff_eq!(pose.position.x, 25.0, epsilon = 1.0e-4);
    }

    #[test]
    fn out_of_order_samples_are_dropped() {
        let mut interp = controller(100, 1_000);
        assert!(interp.push_sample(1, sample(100, 1.0)));
        assert!(!interp.push_sample(1, sample(100, 2.0)));
        assert!(!interp.push_sample(1, sample(50, 3.0)));
        assert_eq!(interp.sample_count(1), 1);
    }

    #[test]
    fn disabled_unknown_or_empty_yield_nothing() {
        let mut interp = controller(100, 1_000);
        assert!(interp.pose_at(9, 0).is_none());

        interp.push_sample(1, sample(0, 0.0));
        interp.set_enabled(1, false);
        assert!(interp.pose_at(1, 50).is_none());
        interp.set_enabled(1, true);
        assert!(interp.pose_at(1, 50).is_some());

        // Everything ages out.
        assert!(interp.pose_at(1, 10_000).is_none());

        assert!(interp.remove(1));
        assert!(!interp.remove(1));
    }

    #[test]
    fn disabled_timeline_stays_bounded() {
        let mut interp = controller(100, 1_000);
        interp.set_enabled(1, false);

        for i in 0..10_000u64 {
            interp.push_sample(1, sample(i * 50, i as f32));
            assert!(interp.pose_at(1, i * 50).is_none());
        }
        // 1100ms of history at 50ms spacing, plus the newest sample.
        assert_eq!(interp.sample_count(1), 23);
    }

    #[test]
    fn disabling_before_first_sample_sticks() {
        let mut interp = controller(100, 1_000);
        interp.set_enabled(7, false);
        interp.push_sample(7, sample(0, 1.0));

        assert!(interp.pose_at(7, 500).is_none());
        assert_eq!(interp.sample_count(7), 1);
    }

    #[test]
    fn snapshot_feeds_its_entity() {
        let mut interp = controller(0, 1_000);
        let snapshot = AuthoritativeSnapshot {
            entity_id: 4,
            x: 1.0,
            y: 2.0,
            z: 3.0,
            facing_yaw: 0.5,
            velocity_y: 0.0,
            grounded: true,
            last_processed_seq: 1,
            server_time_ms: 40,
        };
        assert!(interp.push_snapshot(&snapshot));

        let pose = interp.pose_at(4, 40).unwrap();
        assert_eq!(pose.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(pose.facing_yaw, 0.5);
    }
}
