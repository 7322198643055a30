pub mod clock;
pub mod collision;
pub mod constants;
pub mod input_buffer;
pub mod movement;
pub mod protocol;
pub mod rapier_world;
pub mod settings;
pub mod utils;

pub use clock::{Clock, ManualClock, SystemClock};
pub use collision::{
    GroundProbe, HalfSpaceTerrain, TerrainQuery, Vec2, Vec3, Walkability, classify_ground,
    probe_ground, sweep_and_slide,
};
pub use constants::*;
pub use input_buffer::{InputMoveBuffer, Seq, Sequenced};
pub use movement::{CollisionInfo, CollisionSimulator, StepInput, StepOutput};
pub use protocol::{
    AuthoritativeSnapshot, ClientMessage, MoveMessage, ProtocolError, ServerMessage, SnapMessage,
    decode_client, decode_server, encode_client, encode_server,
};
pub use rapier_world::{ColliderShapeDef, RapierQueryWorld, WorldStaticDef};
pub use settings::{
    CapsuleSpec, MovementSettings, MovementSpeeds, SettingsError, SimulationConstants,
    from_ron_str, load_ron_file,
};
pub use utils::{
    approach_angle, forward_from_yaw, lerp_angle, planar_distance_sq, right_from_yaw, to_planar,
    wrap_angle, yaw_from_xz,
};
