use shared::Vec3;

/// Hard-correction gate for one connection.
///
/// While engaged, the connection's moves are not simulated. The lock releases once the client
/// reports a position close enough to the target, which proves it applied the snap.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SnapLock {
    locked: bool,
    target: Vec3,
}

impl SnapLock {
    pub fn engage(&mut self, target: Vec3) {
        self.locked = true;
        self.target = target;
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Lock target, if engaged.
    pub fn target(&self) -> Option<Vec3> {
        self.locked.then_some(self.target)
    }

    /// Release the lock if `reported` lies within `radius` of the target.
    ///
    /// Returns `true` only on the transition from locked to unlocked.
    pub fn try_release(&mut self, reported: &Vec3, radius: f32) -> bool {
        if !self.locked {
            return false;
        }
        if (reported - self.target).norm_squared() > radius * radius {
            return false;
        }
        self.locked = false;
        true
    }
}
