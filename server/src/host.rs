use crate::{
    config::{ServerConfig, ValidatorConfig},
    validator::{Admission, ServerMovementValidator},
};
use shared::{
    ClientMessage, Clock, CollisionSimulator, MovementSettings, ProtocolError, ServerMessage,
    TerrainQuery, Vec3, decode_client,
};
use std::collections::BTreeMap;

pub type ConnectionId = u64;

/// A message produced by the server, addressed to one connection or to all of them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Outgoing {
    To(ConnectionId, ServerMessage),
    Broadcast(ServerMessage),
}

/// Delivery of server messages. The host owns the actual transport.
pub trait ServerOutbox {
    fn send_to(&mut self, connection: ConnectionId, msg: ServerMessage);
    fn broadcast(&mut self, msg: ServerMessage);
}

impl ServerOutbox for Vec<Outgoing> {
    fn send_to(&mut self, connection: ConnectionId, msg: ServerMessage) {
        self.push(Outgoing::To(connection, msg));
    }

    fn broadcast(&mut self, msg: ServerMessage) {
        self.push(Outgoing::Broadcast(msg));
    }
}

/// All connected movers and the authoritative tick that drives them.
///
/// Connections are kept ordered by id so every tick visits them in the same order.
pub struct MovementServer {
    settings: MovementSettings,
    config: ValidatorConfig,
    simulator: CollisionSimulator,
    connections: BTreeMap<ConnectionId, ServerMovementValidator>,
    tick: u64,
}

impl MovementServer {
    pub fn new(settings: MovementSettings, config: ValidatorConfig) -> Self {
        Self {
            simulator: CollisionSimulator::new(settings.capsule),
            settings,
            config,
            connections: BTreeMap::new(),
            tick: 0,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.movement, config.validator)
    }

    pub fn settings(&self) -> &MovementSettings {
        &self.settings
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn validator(&self, id: ConnectionId) -> Option<&ServerMovementValidator> {
        self.connections.get(&id)
    }

    /// Register a connection whose entity spawns at `spawn`. The entity id is the connection id.
    ///
    /// Reconnecting with a known id replaces the previous state.
    pub fn connect(&mut self, id: ConnectionId, spawn: Vec3, grounded: bool) {
        let validator =
            ServerMovementValidator::new(id, spawn, grounded, &self.settings, &self.config);
        if self.connections.insert(id, validator).is_some() {
            log::info!("Connection {id} re-joined; movement state reset");
        } else {
            log::info!("Connection {id} joined at {spawn:?}");
        }
    }

    pub fn disconnect(&mut self, id: ConnectionId) -> bool {
        let removed = self.connections.remove(&id).is_some();
        if removed {
            log::info!("Connection {id} left");
        }
        removed
    }

    /// Admit a message from `id`. Unknown connections are ignored.
    pub fn receive(&mut self, id: ConnectionId, msg: ClientMessage) -> Option<Admission> {
        let Some(validator) = self.connections.get_mut(&id) else {
            log::trace!("Dropped message from unknown connection {id}");
            return None;
        };

        match msg {
            ClientMessage::Move(m) => Some(validator.receive_move(m, &self.config)),
        }
    }

    /// Decode and admit a JSON message from `id`.
    pub fn receive_text(
        &mut self,
        id: ConnectionId,
        text: &str,
    ) -> Result<Option<Admission>, ProtocolError> {
        let msg = decode_client(text)?;
        Ok(self.receive(id, msg))
    }

    /// One authoritative tick: simulate every connection, send snaps, and broadcast snapshots
    /// on the configured interval.
    pub fn tick<T, O, C>(&mut self, terrain: &T, outbox: &mut O, clock: &C)
    where
        T: TerrainQuery + ?Sized,
        O: ServerOutbox + ?Sized,
        C: Clock + ?Sized,
    {
        self.tick += 1;

        // ---------------------------------------------------------------------------------------
        // Simulate queued moves
        // ---------------------------------------------------------------------------------------
        for (id, validator) in self.connections.iter_mut() {
            if let Some(snap) =
                validator.simulate_tick(terrain, &self.simulator, &self.settings, &self.config)
            {
                outbox.send_to(*id, ServerMessage::Snap(snap));
            }
        }

        // ---------------------------------------------------------------------------------------
        // Snapshot broadcast
        // ---------------------------------------------------------------------------------------
        let interval = u64::from(self.config.snapshot_interval_ticks.max(1));
        if self.tick % interval == 0 {
            let now = clock.now_ms();
            for validator in self.connections.values() {
                outbox.broadcast(ServerMessage::Snapshot(validator.snapshot(now)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{
        FIXED_DT, HalfSpaceTerrain, ManualClock, MoveMessage, StepInput, Vec2, encode_client,
    };

    fn spawn() -> Vec3 {
        let s = MovementSettings::default();
        Vec3::new(0.0, s.capsule.feet_offset() + s.constants.skin, 0.0)
    }

    fn server() -> MovementServer {
        MovementServer::new(
            MovementSettings::default(),
            ValidatorConfig {
                snapshot_interval_ticks: 2,
                ..ValidatorConfig::default()
            },
        )
    }

    fn honest_move(seq: u32) -> MoveMessage {
        let s = MovementSettings::default();
        let out = CollisionSimulator::new(s.capsule).step(
            &HalfSpaceTerrain::flat(0.0),
            &StepInput {
                position: spawn(),
                direction: Vec2::new(1.0, 0.0),
                dt: FIXED_DT,
                speed: s.speeds.walk_mps,
                velocity_y: 0.0,
                grounded: true,
                jump_pressed: false,
            },
            &s.constants,
        );
        MoveMessage {
            direction_x: 1.0,
            direction_z: 0.0,
            jump_pressed: false,
            seq,
            tick: 1,
            is_sprinting: false,
            predicted_x: out.position.x,
            predicted_y: out.position.y,
            predicted_z: out.position.z,
        }
    }

    #[test]
    fn snapshots_are_broadcast_on_interval() {
        let terrain = HalfSpaceTerrain::flat(0.0);
        let clock = ManualClock::new(500);
        let mut server = server();
        server.connect(1, spawn(), true);
        server.connect(2, spawn(), true);

        let mut outbox: Vec<Outgoing> = Vec::new();
        server.tick(&terrain, &mut outbox, &clock);
        assert!(outbox.is_empty());

        server.tick(&terrain, &mut outbox, &clock);
        let ids: Vec<u64> = outbox
            .iter()
            .filter_map(|o| match o {
                Outgoing::Broadcast(ServerMessage::Snapshot(s)) => Some(s.entity_id),
                _ => None,
            })
            .collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(outbox.iter().all(|o| matches!(
            o,
            Outgoing::Broadcast(ServerMessage::Snapshot(s)) if s.server_time_ms == 500
        )));
    }

    #[test]
    fn honest_move_is_acknowledged_in_snapshot() {
        let terrain = HalfSpaceTerrain::flat(0.0);
        let clock = ManualClock::new(0);
        let mut server = server();
        server.connect(7, spawn(), true);

        let text = encode_client(&ClientMessage::Move(honest_move(1))).unwrap();
        assert_eq!(server.receive_text(7, &text).unwrap(), Some(Admission::Queued));

        let mut outbox: Vec<Outgoing> = Vec::new();
        server.tick(&terrain, &mut outbox, &clock);
        server.tick(&terrain, &mut outbox, &clock);
        match outbox.as_slice() {
            [Outgoing::Broadcast(ServerMessage::Snapshot(s))] => {
                assert_eq!(s.last_processed_seq, 1);
                assert!(s.x > 0.0);
            }
            other => panic!("unexpected outbox {other:?}"),
        }
    }

    #[test]
    fn divergence_sends_snap_to_offender_only() {
        let terrain = HalfSpaceTerrain::flat(0.0);
        let clock = ManualClock::new(0);
        let mut server = server();
        server.connect(1, spawn(), true);
        server.connect(2, spawn(), true);

        let mut cheat = honest_move(1);
        cheat.predicted_x = 25.0;
        server.receive(2, ClientMessage::Move(cheat));
        server.receive(1, ClientMessage::Move(honest_move(1)));

        let mut outbox: Vec<Outgoing> = Vec::new();
        server.tick(&terrain, &mut outbox, &clock);
        assert_eq!(outbox.len(), 1);
        assert!(matches!(
            outbox[0],
            Outgoing::To(2, ServerMessage::Snap(snap)) if snap.seq == 1
        ));
        assert!(server.validator(2).is_some_and(|v| v.is_locked()));
        assert!(server.validator(1).is_some_and(|v| !v.is_locked()));
    }

    #[test]
    fn unknown_connections_are_ignored() {
        let mut server = server();
        assert_eq!(server.receive(3, ClientMessage::Move(honest_move(1))), None);
        assert!(server.receive_text(3, "{").is_err());

        server.connect(3, spawn(), true);
        assert!(server.disconnect(3));
        assert!(!server.disconnect(3));
        assert_eq!(server.connection_count(), 0);
    }
}
