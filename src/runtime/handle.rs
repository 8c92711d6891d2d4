//! DeviceHandle - public API for a running device actor
//!
//! Batches and removal are fire-and-forget. Status queries go through a
//! oneshot channel and are answered after every batch sent before them.

use tokio::sync::{mpsc, oneshot};

use super::commands::DeviceCommand;
use crate::device::{DeviceStatus, Event};
use crate::error::BridgeError;

/// Handle for one device actor
#[derive(Clone)]
pub struct DeviceHandle {
    name: String,
    cmd_tx: mpsc::UnboundedSender<DeviceCommand>,
}

impl DeviceHandle {
    pub(super) fn new(name: String, cmd_tx: mpsc::UnboundedSender<DeviceCommand>) -> Self {
        Self { name, cmd_tx }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue an event batch
    ///
    /// Fails only when the actor has already stopped.
    pub fn send_batch(&self, events: Vec<Event>) -> Result<(), BridgeError> {
        self.cmd_tx
            .send(DeviceCommand::Batch(events))
            .map_err(|_| BridgeError::ActorStopped(self.name.clone()))
    }

    /// Remove the device; the actor releases its handler and stops
    pub fn remove(&self, unexpected: bool) {
        let _ = self.cmd_tx.send(DeviceCommand::Remove { unexpected });
    }

    /// Current mode status, `None` once the actor is gone
    pub async fn status(&self) -> Option<DeviceStatus> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(DeviceCommand::Status { response: tx })
            .ok()?;
        rx.await.ok().flatten()
    }

    /// Blocking variant of [`status`](Self::status) for non-async threads
    ///
    /// Must not be called from inside the runtime.
    pub fn status_blocking(&self) -> Option<DeviceStatus> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(DeviceCommand::Status { response: tx })
            .ok()?;
        rx.blocking_recv().ok().flatten()
    }

    pub fn is_alive(&self) -> bool {
        !self.cmd_tx.is_closed()
    }

    /// Wait until the actor has stopped
    pub async fn closed(&self) {
        self.cmd_tx.closed().await
    }
}
