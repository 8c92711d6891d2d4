//! Commands accepted by a device actor

use tokio::sync::oneshot;

use crate::device::{DeviceStatus, Event};

/// Commands for one device actor
///
/// `Batch` and `Remove` are fire-and-forget; `Status` answers through a
/// oneshot channel.
#[derive(Debug)]
pub enum DeviceCommand {
    /// Ordered batch of input events from the device layer
    Batch(Vec<Event>),

    /// Query the handler's mode state
    Status {
        response: oneshot::Sender<Option<DeviceStatus>>,
    },

    /// Device removed: release the handler and stop the actor
    Remove { unexpected: bool },
}
