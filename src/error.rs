//! Error types shared by the bridge core and its collaborators

use thiserror::Error;

/// Failure reported by an output collaborator (protocol port or light surface)
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("output port is not connected")]
    NotConnected,

    #[error("MIDI send failed: {0}")]
    Send(String),
}

/// Reasons a device instance is rejected when it is accepted
#[derive(Debug, Error)]
pub enum AcceptError {
    #[error("device '{0}' reports no controls")]
    NoControls(String),

    #[error("mode button id {id} for '{role}' collides with another mode button")]
    ModeButtonCollision { role: &'static str, id: u32 },

    #[error("failed to open protocol output for '{device}': {reason}")]
    Output { device: String, reason: String },
}

/// Top-level error for the runtime
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Accept(#[from] AcceptError),

    #[error("device actor for '{0}' has stopped")]
    ActorStopped(String),
}
