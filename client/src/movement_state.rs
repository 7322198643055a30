use crate::interpolation::RemotePose;
use shared::{SimulationConstants, Vec3, lerp_angle};

/// Render-facing movement state of one entity.
///
/// The local mover's state is written by the controller; remote entities' by interpolation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MovementState {
    /// Where the entity should be drawn at the end of the current tick.
    pub render_target: Vec3,
    /// Where it was drawn at the end of the previous tick.
    pub previous_target: Vec3,
    /// Latest server-confirmed position.
    pub authoritative: Vec3,
    pub facing_yaw: f32,
    pub previous_facing_yaw: f32,
    pub movement_yaw: f32,
    pub velocity_y: f32,
    pub grounded: bool,
}

impl MovementState {
    /// A grounded state starts with the ground-stick velocity.
    pub fn new(position: Vec3, grounded: bool, constants: &SimulationConstants) -> Self {
        Self {
            render_target: position,
            previous_target: position,
            authoritative: position,
            facing_yaw: 0.0,
            previous_facing_yaw: 0.0,
            movement_yaw: 0.0,
            velocity_y: if grounded {
                constants.ground_stick_velocity_mps
            } else {
                0.0
            },
            grounded,
        }
    }

    /// Place the entity at `position` with no in-between frames.
    pub fn teleport(&mut self, position: Vec3) {
        self.render_target = position;
        self.previous_target = position;
        self.authoritative = position;
    }

    /// Start a new tick: the current target becomes the interpolation origin.
    pub fn begin_tick(&mut self) {
        self.previous_target = self.render_target;
        self.previous_facing_yaw = self.facing_yaw;
    }

    /// Pose to draw `alpha` (0..1) of the way through the current tick.
    pub fn render_pose(&self, alpha: f32) -> (Vec3, f32) {
        let t = if alpha.is_finite() {
            alpha.clamp(0.0, 1.0)
        } else {
            1.0
        };
        (
            self.previous_target.lerp(&self.render_target, t),
            lerp_angle(self.previous_facing_yaw, self.facing_yaw, t),
        )
    }

    /// Write an interpolated remote pose.
    pub fn apply_remote_pose(&mut self, pose: &RemotePose) {
        self.begin_tick();
        self.render_target = pose.position;
        self.authoritative = pose.position;
        self.facing_yaw = pose.facing_yaw;
        self.movement_yaw = pose.facing_yaw;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::PI;

    fn constants() -> SimulationConstants {
        SimulationConstants::default()
    }

    #[test]
    fn render_pose_blends_previous_and_target() {
        let mut state = MovementState::new(Vec3::zeros(), true, &constants());
        state.begin_tick();
        state.render_target = Vec3::new(2.0, 0.0, 0.0);
        state.facing_yaw = 0.5;

        let (pos, yaw) = state.render_pose(0.25);
        assert_abs_diff_eq!(pos, Vec3::new(0.5, 0.0, 0.0), epsilon = 1.0e-6);
        assert_abs_diff_eq!(yaw, 0.125, epsilon = 1.0e-6);
        assert_eq!(state.render_pose(7.0).0, state.render_target);
    }

    #[test]
    fn grounded_state_starts_with_stick_velocity() {
        let grounded = MovementState::new(Vec3::zeros(), true, &constants());
        assert_eq!(grounded.velocity_y, constants().ground_stick_velocity_mps);

        let airborne = MovementState::new(Vec3::zeros(), false, &constants());
        assert_eq!(airborne.velocity_y, 0.0);
    }

    #[test]
    fn facing_blends_across_the_seam() {
        let mut state = MovementState::new(Vec3::zeros(), true, &constants());
        state.facing_yaw = PI - 0.1;
        state.begin_tick();
        state.facing_yaw = -PI + 0.1;

        let (_, yaw) = state.render_pose(0.5);
        assert_abs_diff_eq!(yaw.abs(), PI, epsilon = 1.0e-5);
    }

    #[test]
    fn remote_pose_moves_target_and_keeps_previous() {
        let mut state = MovementState::new(Vec3::zeros(), false, &constants());
        state.apply_remote_pose(&RemotePose {
            position: Vec3::new(1.0, 2.0, 3.0),
            facing_yaw: 1.0,
        });
        assert_eq!(state.previous_target, Vec3::zeros());
        assert_eq!(state.render_target, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(state.facing_yaw, 1.0);
    }
}
