//! Wire messages exchanged between client and server, and their JSON codec.
//!
//! Enums are internally tagged (`"type": "move" | "snapshot" | "snap"`); fields are camelCase.

use crate::{
    collision::{Vec2, Vec3},
    input_buffer::{Seq, Sequenced},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
}

/// One predicted tick of movement, client to server.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveMessage {
    pub direction_x: f32,
    pub direction_z: f32,
    pub jump_pressed: bool,
    pub seq: Seq,
    pub tick: u64,
    pub is_sprinting: bool,
    pub predicted_x: f32,
    pub predicted_y: f32,
    pub predicted_z: f32,
}

impl MoveMessage {
    #[inline]
    pub fn direction(&self) -> Vec2 {
        Vec2::new(self.direction_x, self.direction_z)
    }

    #[inline]
    pub fn predicted(&self) -> Vec3 {
        Vec3::new(self.predicted_x, self.predicted_y, self.predicted_z)
    }

    /// Every float in the payload is finite.
    pub fn is_finite(&self) -> bool {
        [
            self.direction_x,
            self.direction_z,
            self.predicted_x,
            self.predicted_y,
            self.predicted_z,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

impl Sequenced for MoveMessage {
    #[inline]
    fn seq(&self) -> Seq {
        self.seq
    }
}

/// Authoritative state of one entity, server to clients.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthoritativeSnapshot {
    pub entity_id: u64,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub facing_yaw: f32,
    pub velocity_y: f32,
    pub grounded: bool,
    pub last_processed_seq: Seq,
    pub server_time_ms: u64,
}

impl AuthoritativeSnapshot {
    #[inline]
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

/// Hard correction, server to the owning client.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapMessage {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub seq: Seq,
}

impl SnapMessage {
    pub fn new(pos: Vec3, seq: Seq) -> Self {
        Self {
            x: pos.x,
            y: pos.y,
            z: pos.z,
            seq,
        }
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Move(MoveMessage),
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Snapshot(AuthoritativeSnapshot),
    Snap(SnapMessage),
}

pub fn encode_client(msg: &ClientMessage) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(msg)?)
}

pub fn decode_client(text: &str) -> Result<ClientMessage, ProtocolError> {
    Ok(serde_json::from_str(text)?)
}

pub fn encode_server(msg: &ServerMessage) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(msg)?)
}

pub fn decode_server(text: &str) -> Result<ServerMessage, ProtocolError> {
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn move_message_uses_tagged_camel_case_fields() {
        let msg = ClientMessage::Move(MoveMessage {
            direction_x: 1.0,
            direction_z: 0.0,
            jump_pressed: true,
            seq: 7,
            tick: 42,
            is_sprinting: false,
            predicted_x: 0.5,
            predicted_y: 1.0,
            predicted_z: -2.0,
        });

        let text = encode_client(&msg).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["type"], "move");
        assert_eq!(value["directionX"], 1.0);
        assert_eq!(value["jumpPressed"], true);
        assert_eq!(value["predictedZ"], -2.0);
        assert_eq!(value["seq"], 7);

        assert_eq!(decode_client(&text).unwrap(), msg);
    }

    #[test]
    fn decodes_hand_written_snap() {
        let msg = decode_server(r#"{"type":"snap","x":1.0,"y":2.0,"z":3.0,"seq":9}"#).unwrap();
        assert_eq!(
            msg,
            ServerMessage::Snap(SnapMessage::new(Vec3::new(1.0, 2.0, 3.0), 9))
        );
    }

    #[test]
    fn snapshot_carries_routing_fields() {
        let msg = ServerMessage::Snapshot(AuthoritativeSnapshot {
            entity_id: 3,
            x: 0.0,
            y: 1.0,
            z: 0.0,
            facing_yaw: 0.25,
            velocity_y: -0.5,
            grounded: true,
            last_processed_seq: 11,
            server_time_ms: 1_000,
        });
        let value: Value = serde_json::from_str(&encode_server(&msg).unwrap()).unwrap();
        assert_eq!(value["type"], "snapshot");
        assert_eq!(value["entityId"], 3);
        assert_eq!(value["lastProcessedSeq"], 11);
        assert_eq!(value["serverTimeMs"], 1_000);
    }

    #[test]
    fn unknown_type_is_an_error() {
        assert!(matches!(
            decode_server(r#"{"type":"teleport","x":1.0}"#),
            Err(ProtocolError::Json(_))
        ));
        assert!(decode_client("not json").is_err());
    }

    #[test]
    fn non_finite_payload_is_detected() {
        let mut m = MoveMessage {
            direction_x: 0.0,
            direction_z: 0.0,
            jump_pressed: false,
            seq: 1,
            tick: 1,
            is_sprinting: false,
            predicted_x: 0.0,
            predicted_y: 0.0,
            predicted_z: 0.0,
        };
        assert!(m.is_finite());
        m.predicted_y = f32::INFINITY;
        assert!(!m.is_finite());
    }
}
