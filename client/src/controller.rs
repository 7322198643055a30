use crate::{
    config::ClientMovementConfig,
    input::MovementInput,
    movement_state::MovementState,
    transport::{MoveTransport, MovementListener},
};
use shared::{
    AuthoritativeSnapshot, ClientMessage, CollisionSimulator, FIXED_DT, InputMoveBuffer,
    MoveMessage, MovementSettings, Seq, Sequenced, ServerMessage, StepInput, StepOutput,
    TerrainQuery, Vec2, Vec3, approach_angle,
};

/// A predicted move awaiting server acknowledgment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PendingMove {
    pub seq: Seq,
    pub tick: u64,
    pub direction: Vec2,
    pub jump_pressed: bool,
    pub is_sprinting: bool,
    /// Vertical velocity after the move.
    pub velocity_y: f32,
    /// Grounded after the move.
    pub grounded: bool,
    /// Position after the move.
    pub predicted: Vec3,
}

impl Sequenced for PendingMove {
    fn seq(&self) -> Seq {
        self.seq
    }
}

/// Outcome of the latest reconciliation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReconcileReport {
    pub ack: Seq,
    /// Pending moves re-simulated on top of the authoritative state.
    pub replayed: usize,
    /// Replayed position minus rendered position.
    pub delta: Vec3,
    pub snap_warranted: bool,
    pub snap_applied: bool,
}

impl ReconcileReport {
    pub fn horizontal(&self) -> f32 {
        Vec2::new(self.delta.x, self.delta.z).norm()
    }

    pub fn vertical(&self) -> f32 {
        self.delta.y.abs()
    }
}

/// Prediction, buffering, transmission and reconciliation for the locally controlled entity.
pub struct ClientMovementController {
    entity_id: u64,
    settings: MovementSettings,
    config: ClientMovementConfig,
    simulator: CollisionSimulator,
    state: MovementState,
    pending: InputMoveBuffer<PendingMove>,
    /// Last sequence number handed out.
    seq: Seq,
    last_acked_seq: Seq,
    tick: u64,
    was_active: bool,
    idle_time_s: f32,
    last_report: Option<ReconcileReport>,
}

impl ClientMovementController {
    pub fn new(
        entity_id: u64,
        spawn: Vec3,
        grounded: bool,
        settings: MovementSettings,
        config: ClientMovementConfig,
    ) -> Self {
        Self {
            entity_id,
            simulator: CollisionSimulator::new(settings.capsule),
            settings,
            config,
            state: MovementState::new(spawn, grounded, &settings.constants),
            pending: InputMoveBuffer::with_capacity(config.buffer_capacity),
            seq: 0,
            last_acked_seq: 0,
            tick: 0,
            was_active: false,
            idle_time_s: 0.0,
            last_report: None,
        }
    }

    pub fn entity_id(&self) -> u64 {
        self.entity_id
    }

    pub fn state(&self) -> &MovementState {
        &self.state
    }

    pub fn settings(&self) -> &MovementSettings {
        &self.settings
    }

    pub fn config(&self) -> &ClientMovementConfig {
        &self.config
    }

    pub fn set_ignore_server_corrections(&mut self, ignore: bool) {
        self.config.ignore_server_corrections = ignore;
    }

    pub fn pending(&self) -> &InputMoveBuffer<PendingMove> {
        &self.pending
    }

    pub fn last_seq(&self) -> Seq {
        self.seq
    }

    pub fn last_acked_seq(&self) -> Seq {
        self.last_acked_seq
    }

    pub fn last_report(&self) -> Option<&ReconcileReport> {
        self.last_report.as_ref()
    }

    /// Pose to draw `alpha` (0..1) of the way through the current fixed tick.
    pub fn render_pose(&self, alpha: f32) -> (Vec3, f32) {
        self.state.render_pose(alpha)
    }

    /// One fixed tick of local prediction.
    ///
    /// Returns the simulation result when a move was predicted and sent.
    pub fn tick<T, X, L>(
        &mut self,
        input: &MovementInput,
        terrain: &T,
        transport: &mut X,
        listener: &mut L,
    ) -> Option<StepOutput>
    where
        T: TerrainQuery + ?Sized,
        X: MoveTransport + ?Sized,
        L: MovementListener + ?Sized,
    {
        self.tick += 1;
        self.state.begin_tick();

        let wants_to_move = input.is_active();
        if wants_to_move && !self.was_active {
            listener.movement_started();
        }
        self.was_active = wants_to_move;

        // Airborne movers keep falling without input.
        if !wants_to_move && self.state.grounded {
            self.correct_idle_drift();
            return None;
        }
        self.idle_time_s = 0.0;

        let direction = input.direction();
        let out = self.simulator.step(
            terrain,
            &StepInput {
                position: self.state.render_target,
                direction,
                dt: FIXED_DT,
                speed: self.settings.speeds.for_input(input.sprint),
                velocity_y: self.state.velocity_y,
                grounded: self.state.grounded,
                jump_pressed: input.jump,
            },
            &self.settings.constants,
        );

        self.state.velocity_y = out.velocity_y;
        self.state.grounded = out.grounded;
        if let Some(yaw) = out.movement_yaw {
            self.state.movement_yaw = yaw;
        }
        self.state.facing_yaw = approach_angle(
            self.state.facing_yaw,
            self.state.movement_yaw,
            self.config.turn_rate_rad_s.max(0.0) * FIXED_DT,
        );

        self.seq += 1;
        let pending = PendingMove {
            seq: self.seq,
            tick: self.tick,
            direction,
            jump_pressed: input.jump,
            is_sprinting: input.sprint,
            velocity_y: out.velocity_y,
            grounded: out.grounded,
            predicted: out.position,
        };
        if let Some(evicted) = self.pending.enqueue(pending) {
            log::debug!("Pending move buffer full; dropped move {}", evicted.seq);
        }

        transport.send(ClientMessage::Move(MoveMessage {
            direction_x: direction.x,
            direction_z: direction.y,
            jump_pressed: input.jump,
            seq: self.seq,
            tick: self.tick,
            is_sprinting: input.sprint,
            predicted_x: out.position.x,
            predicted_y: out.position.y,
            predicted_z: out.position.z,
        }));

        self.state.render_target = out.position;
        Some(out)
    }

    fn correct_idle_drift(&mut self) {
        self.idle_time_s += FIXED_DT;
        if self.idle_time_s <= self.config.idle_snap_delay_s {
            return;
        }

        let drift = (self.state.render_target - self.state.authoritative).norm();
        if drift <= self.config.idle_drift_epsilon {
            return;
        }
        if self.config.ignore_server_corrections {
            log::trace!("Idle drift of {drift:.3}m left uncorrected");
        } else {
            log::debug!("Idle drift of {drift:.3}m; snapping to authoritative position");
            let authoritative = self.state.authoritative;
            self.state.teleport(authoritative);
        }
    }

    /// Route a server message for the local entity. Snapshots of other entities are ignored
    /// (they belong to remote interpolation).
    pub fn handle_server_message<T, X>(
        &mut self,
        msg: &ServerMessage,
        terrain: &T,
        transport: &mut X,
    ) -> Option<ReconcileReport>
    where
        T: TerrainQuery + ?Sized,
        X: MoveTransport + ?Sized,
    {
        match msg {
            ServerMessage::Snapshot(s) if s.entity_id == self.entity_id => {
                self.reconcile_from_server_state(s, None, terrain)
            }
            ServerMessage::Snapshot(_) => None,
            ServerMessage::Snap(snap) => {
                self.apply_server_snap(snap.position(), snap.seq, transport);
                None
            }
        }
    }

    /// Reconcile local prediction with an authoritative snapshot.
    ///
    /// Acknowledged moves are retired and the rest replayed from the authoritative state (or
    /// `override_position`). The rendered position is hard-snapped only when the replayed
    /// result is off by more than the configured tolerances.
    pub fn reconcile_from_server_state<T: TerrainQuery + ?Sized>(
        &mut self,
        snapshot: &AuthoritativeSnapshot,
        override_position: Option<Vec3>,
        terrain: &T,
    ) -> Option<ReconcileReport> {
        let ack = snapshot.last_processed_seq;
        if ack < self.last_acked_seq {
            log::trace!("Ignored stale snapshot ack {ack} < {}", self.last_acked_seq);
            return None;
        }
        self.last_acked_seq = ack;
        // A server that has seen moves we no longer remember (e.g. across a reconnect)
        // must not make us reuse sequence numbers.
        self.seq = self.seq.max(ack);

        let base = override_position.unwrap_or_else(|| snapshot.position());
        self.state.authoritative = base;
        self.pending.drop_up_to(ack);

        let mut pos = base;
        let mut velocity_y = snapshot.velocity_y;
        let mut grounded = snapshot.grounded;
        let mut replayed = 0;

        for m in self.pending.iter_mut() {
            let out = self.simulator.step(
                terrain,
                &StepInput {
                    position: pos,
                    direction: m.direction,
                    dt: FIXED_DT,
                    speed: self.settings.speeds.for_input(m.is_sprinting),
                    velocity_y,
                    grounded,
                    jump_pressed: m.jump_pressed,
                },
                &self.settings.constants,
            );
            (pos, velocity_y, grounded) = (out.position, out.velocity_y, out.grounded);
            m.predicted = pos;
            m.velocity_y = velocity_y;
            m.grounded = grounded;
            replayed += 1;
        }

        let delta = pos - self.state.render_target;
        let horizontal = Vec2::new(delta.x, delta.z).norm();
        let vertical_tolerance = if grounded {
            self.config.grounded_vertical_tolerance
        } else {
            self.config.airborne_vertical_tolerance
        };
        let snap_warranted = horizontal > self.config.reconcile_horizontal_epsilon
            || delta.y.abs() > vertical_tolerance;

        let snap_applied = snap_warranted && !self.config.ignore_server_corrections;
        if snap_applied {
            log::debug!(
                "Reconcile snap at ack {ack}: horizontal {horizontal:.3}m, vertical {:.3}m",
                delta.y.abs()
            );
            self.state.render_target = pos;
            self.state.previous_target = pos;
        }
        if !self.config.ignore_server_corrections {
            self.state.velocity_y = velocity_y;
            self.state.grounded = grounded;
        }

        let report = ReconcileReport {
            ack,
            replayed,
            delta,
            snap_warranted,
            snap_applied,
        };
        self.last_report = Some(report);
        Some(report)
    }

    /// Apply a hard correction from the server.
    ///
    /// Drops all pending moves, resets vertical state, and immediately confirms with a
    /// zero-movement move from the snapped position so the server can release its lock.
    pub fn apply_server_snap<X: MoveTransport + ?Sized>(
        &mut self,
        position: Vec3,
        seq: Seq,
        transport: &mut X,
    ) {
        log::debug!("Server snap to {position:?} at seq {seq}");

        self.state.teleport(position);
        self.state.velocity_y = 0.0;
        self.state.grounded = false;
        self.pending.clear();
        self.last_acked_seq = self.last_acked_seq.max(seq);
        self.seq = self.seq.max(seq) + 1;
        self.idle_time_s = 0.0;

        transport.send(ClientMessage::Move(MoveMessage {
            direction_x: 0.0,
            direction_z: 0.0,
            jump_pressed: false,
            seq: self.seq,
            tick: self.tick,
            is_sprinting: false,
            predicted_x: position.x,
            predicted_y: position.y,
            predicted_z: position.z,
        }));
    }
}
