//! Per-device runtime: an actor task per accepted device and the pump that
//! feeds it from an event source.

mod actor;
mod commands;
mod handle;

pub use actor::DeviceActor;
pub use commands::DeviceCommand;
pub use handle::DeviceHandle;

use std::future::Future;

use tracing::{debug, info, warn};

use crate::device::EventSource;

/// Why [`run`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The source has no more batches
    SourceEnded,
    /// The shutdown future completed
    Shutdown,
    /// The actor stopped on its own
    ActorStopped,
}

/// Pump batches from `source` into the device actor
///
/// Returns without removing the device; the caller decides whether the
/// removal is expected.
pub async fn run<F>(source: &mut dyn EventSource, handle: &DeviceHandle, shutdown: F) -> StopReason
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut forwarded = 0u64;

    let reason = loop {
        tokio::select! {
            _ = &mut shutdown => break StopReason::Shutdown,
            batch = source.next_batch() => match batch {
                Some(events) if events.is_empty() => continue,
                Some(events) => {
                    if let Err(e) = handle.send_batch(events) {
                        warn!("{}", e);
                        break StopReason::ActorStopped;
                    }
                    forwarded += 1;
                }
                None => break StopReason::SourceEnded,
            },
        }
    };

    debug!("{}: forwarded {} batches", handle.name(), forwarded);
    info!("{}: event pump stopped ({:?})", handle.name(), reason);
    reason
}
