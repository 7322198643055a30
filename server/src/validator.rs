use crate::{config::ValidatorConfig, snap_lock::SnapLock};
use shared::{
    AuthoritativeSnapshot, CollisionSimulator, FIXED_DT, InputMoveBuffer, MoveMessage,
    MovementSettings, Seq, SnapMessage, StepInput, TerrainQuery, Vec3,
};

/// What happened to an inbound move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// Appended to the simulation queue.
    Queued,
    /// Already processed or already queued.
    Stale,
    /// Snap-locked and the move does not confirm the snap.
    LockedDiscard,
    /// The move confirmed the snap and released the lock.
    Unlocked,
    /// Non-finite payload.
    Rejected,
}

/// Authoritative movement for one connection.
///
/// Moves are admitted on receipt and simulated later, on the authoritative tick, within a
/// per-connection budget.
#[derive(Clone, Debug)]
pub struct ServerMovementValidator {
    entity_id: u64,
    position: Vec3,
    velocity_y: f32,
    grounded: bool,
    facing_yaw: f32,
    last_processed_seq: Seq,
    last_enqueued_seq: Seq,
    queue: InputMoveBuffer<MoveMessage>,
    lock: SnapLock,
    budget: u32,
}

impl ServerMovementValidator {
    /// A grounded spawn starts with the ground-stick velocity, as after any grounded step.
    pub fn new(
        entity_id: u64,
        spawn: Vec3,
        grounded: bool,
        settings: &MovementSettings,
        config: &ValidatorConfig,
    ) -> Self {
        Self {
            entity_id,
            position: spawn,
            velocity_y: if grounded {
                settings.constants.ground_stick_velocity_mps
            } else {
                0.0
            },
            grounded,
            facing_yaw: 0.0,
            last_processed_seq: 0,
            last_enqueued_seq: 0,
            queue: InputMoveBuffer::with_capacity(config.queue_capacity),
            lock: SnapLock::default(),
            budget: 0,
        }
    }

    pub fn entity_id(&self) -> u64 {
        self.entity_id
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn velocity_y(&self) -> f32 {
        self.velocity_y
    }

    pub fn grounded(&self) -> bool {
        self.grounded
    }

    pub fn facing_yaw(&self) -> f32 {
        self.facing_yaw
    }

    pub fn last_processed_seq(&self) -> Seq {
        self.last_processed_seq
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }

    pub fn lock_target(&self) -> Option<Vec3> {
        self.lock.target()
    }

    pub fn budget(&self) -> u32 {
        self.budget
    }

    /// Admit a move received from the client. Nothing is simulated here.
    pub fn receive_move(&mut self, msg: MoveMessage, config: &ValidatorConfig) -> Admission {
        if !msg.is_finite() {
            log::warn!(
                "Rejected non-finite move {} for entity {}",
                msg.seq,
                self.entity_id
            );
            return Admission::Rejected;
        }

        if self.lock.is_locked() {
            if !self.lock.try_release(&msg.predicted(), config.unlock_radius) {
                log::trace!(
                    "Discarded move {} for snap-locked entity {}",
                    msg.seq,
                    self.entity_id
                );
                return Admission::LockedDiscard;
            }

            // The client has applied the snap: resume from this move onward, from the same
            // neutral vertical state the client resets to.
            self.queue.clear();
            self.velocity_y = 0.0;
            self.grounded = false;
            self.budget = config.inputs_per_tick.min(config.max_input_burst);
            self.last_processed_seq = self.last_processed_seq.max(msg.seq);
            self.last_enqueued_seq = self.last_enqueued_seq.max(self.last_processed_seq);
            log::info!(
                "Released snap lock for entity {} at seq {}",
                self.entity_id,
                self.last_processed_seq
            );
            return Admission::Unlocked;
        }

        if msg.seq <= self.last_processed_seq || msg.seq <= self.last_enqueued_seq {
            log::trace!("Discarded stale move {} for entity {}", msg.seq, self.entity_id);
            return Admission::Stale;
        }

        if let Some(evicted) = self.queue.enqueue(msg) {
            log::debug!(
                "Move queue full for entity {}; dropped move {}",
                self.entity_id,
                evicted.seq
            );
        }
        self.last_enqueued_seq = msg.seq;
        Admission::Queued
    }

    /// Run one authoritative tick for this connection.
    ///
    /// Refills the budget, then simulates queued moves oldest first. Returns the snap to send
    /// when a move's prediction diverged beyond the acceptance distance.
    pub fn simulate_tick<T: TerrainQuery + ?Sized>(
        &mut self,
        terrain: &T,
        simulator: &CollisionSimulator,
        settings: &MovementSettings,
        config: &ValidatorConfig,
    ) -> Option<SnapMessage> {
        self.budget = self
            .budget
            .saturating_add(config.inputs_per_tick)
            .min(config.max_input_burst);

        if self.lock.is_locked() {
            return None;
        }

        while self.budget > 0 {
            let Some(msg) = self.queue.pop_front() else {
                break;
            };
            self.budget -= 1;

            let out = simulator.step(
                terrain,
                &StepInput {
                    position: self.position,
                    direction: msg.direction(),
                    dt: FIXED_DT,
                    speed: settings.speeds.for_input(msg.is_sprinting),
                    velocity_y: self.velocity_y,
                    grounded: self.grounded,
                    jump_pressed: msg.jump_pressed,
                },
                &settings.constants,
            );

            self.position = out.position;
            self.velocity_y = out.velocity_y;
            self.grounded = out.grounded;
            if let Some(yaw) = out.movement_yaw {
                self.facing_yaw = yaw;
            }
            self.last_processed_seq = msg.seq;

            let divergence = (msg.predicted() - self.position).norm();
            if divergence > config.acceptance_distance {
                self.lock.engage(self.position);
                self.queue.clear();
                log::warn!(
                    "Entity {} diverged by {:.3}m at seq {}; snap-locking",
                    self.entity_id,
                    divergence,
                    msg.seq
                );
                return Some(SnapMessage::new(self.position, self.last_processed_seq));
            }
        }

        None
    }

    pub fn snapshot(&self, server_time_ms: u64) -> AuthoritativeSnapshot {
        AuthoritativeSnapshot {
            entity_id: self.entity_id,
            x: self.position.x,
            y: self.position.y,
            z: self.position.z,
            facing_yaw: self.facing_yaw,
            velocity_y: self.velocity_y,
            grounded: self.grounded,
            last_processed_seq: self.last_processed_seq,
            server_time_ms,
        }
    }
}
