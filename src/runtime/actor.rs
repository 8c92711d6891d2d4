//! DeviceActor - one task per accepted device
//!
//! The actor owns the device's handler and light surface and services both
//! event batches and its own feedback ticks from a single loop, so the two
//! paths can never run at the same time for one device. Commands and ticks
//! are polled fairly, so a burst of batches cannot hold back feedback.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, trace};

use super::commands::DeviceCommand;
use super::handle::DeviceHandle;
use crate::bridge::{Bridge, BridgeSettings};
use crate::device::{DeviceHandler, DeviceLayout, LightSurface, ProtocolSink};
use crate::error::BridgeError;

/// Actor serializing all work for one device
pub struct DeviceActor {
    name: String,
    handler: Box<dyn DeviceHandler>,
    surface: Box<dyn LightSurface>,
    feedback_interval: Duration,
    command_rx: mpsc::UnboundedReceiver<DeviceCommand>,
    batches: u64,
}

impl DeviceActor {
    /// Spawn the actor on the current runtime and return its handle
    ///
    /// A zero `feedback_interval` is raised to 1ms.
    pub fn spawn(
        name: impl Into<String>,
        handler: Box<dyn DeviceHandler>,
        surface: Box<dyn LightSurface>,
        feedback_interval: Duration,
    ) -> DeviceHandle {
        let name = name.into();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        let actor = DeviceActor {
            name: name.clone(),
            handler,
            surface,
            feedback_interval: feedback_interval.max(Duration::from_millis(1)),
            command_rx: cmd_rx,
            batches: 0,
        };

        tokio::spawn(actor.run());
        info!("Device actor spawned for {}", name);

        DeviceHandle::new(name, cmd_tx)
    }

    /// Accept a device layout into a new [`Bridge`] and spawn its actor
    pub fn accept(
        layout: &DeviceLayout,
        settings: &BridgeSettings,
        sink: Box<dyn ProtocolSink>,
        surface: Box<dyn LightSurface>,
        feedback_interval: Duration,
    ) -> Result<DeviceHandle, BridgeError> {
        let bridge = Bridge::accept(layout, settings, sink)?;
        Ok(Self::spawn(
            bridge.label().to_string(),
            Box::new(bridge),
            surface,
            feedback_interval,
        ))
    }

    async fn run(mut self) {
        debug!(
            "{}: actor loop started (feedback every {:?})",
            self.name, self.feedback_interval
        );

        let mut ticker = interval(self.feedback_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(DeviceCommand::Batch(events)) => {
                        self.batches += 1;
                        trace!("{}: batch #{} with {} events", self.name, self.batches, events.len());
                        self.handler.on_event(&events);
                    }
                    Some(DeviceCommand::Status { response }) => {
                        let _ = response.send(self.handler.status());
                    }
                    Some(DeviceCommand::Remove { unexpected }) => {
                        self.handler.on_remove(unexpected);
                        break;
                    }
                    None => {
                        // Every handle dropped without a removal
                        self.handler.on_remove(true);
                        break;
                    }
                },

                _ = ticker.tick() => {
                    self.handler.on_feedback(self.surface.as_mut());
                }
            }
        }

        info!(
            "{}: actor stopped after {} batches",
            self.name, self.batches
        );
    }
}
