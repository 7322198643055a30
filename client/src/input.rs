use shared::{DIST_EPS, Vec2, forward_from_yaw, right_from_yaw};

/// Movement intent sampled once per fixed tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MovementInput {
    /// Forward/back axis, +1 is forward.
    pub forward: f32,
    /// Strafe axis, +1 is right.
    pub strafe: f32,
    pub jump: bool,
    pub sprint: bool,
    /// Yaw the camera faces; axes are relative to it.
    pub camera_yaw: f32,
}

impl MovementInput {
    /// World-space planar direction, at most unit length.
    pub fn direction(&self) -> Vec2 {
        let forward = sanitize_axis(self.forward);
        let strafe = sanitize_axis(self.strafe);
        let yaw = if self.camera_yaw.is_finite() {
            self.camera_yaw
        } else {
            0.0
        };

        let dir = forward_from_yaw(yaw) * forward + right_from_yaw(yaw) * strafe;
        let len = dir.norm();
        if len <= DIST_EPS {
            Vec2::zeros()
        } else if len > 1.0 {
            dir / len
        } else {
            dir
        }
    }

    /// Something is being requested this tick.
    pub fn is_active(&self) -> bool {
        self.jump || self.direction() != Vec2::zeros()
    }
}

fn sanitize_axis(v: f32) -> f32 {
    if v.is_finite() { v.clamp(-1.0, 1.0) } else { 0.0 }
}
