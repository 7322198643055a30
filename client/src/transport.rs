//! Collaborators the controller talks to. Hosts plug in their network stack and game systems.

use shared::ClientMessage;

/// Outbound, reliable and ordered channel to the server.
pub trait MoveTransport {
    fn send(&mut self, msg: ClientMessage);
}

/// Records outgoing messages; handy as a loopback.
impl MoveTransport for Vec<ClientMessage> {
    fn send(&mut self, msg: ClientMessage) {
        self.push(msg);
    }
}

/// Notified when the local mover goes from idle to moving (e.g. to cancel channelled abilities).
pub trait MovementListener {
    fn movement_started(&mut self);
}

impl<F: FnMut()> MovementListener for F {
    fn movement_started(&mut self) {
        self()
    }
}
