//! Recording collaborators for tests

use parking_lot::Mutex;
use std::sync::Arc;

use crate::bridge::{Bridge, BridgeSettings};
use crate::color::FeedbackColor;
use crate::device::{
    Capabilities, ControlCounts, DeviceLayout, GridInfo, LightSurface, ModeButtons, ProtocolSink,
};
use crate::error::SinkError;

pub const SHIFT: u32 = 0;
pub const GROUP: u32 = 1;
pub const FIXED_VEL: u32 = 2;
pub const GRID_OFFSET: u32 = 100;

/// Sink that keeps every written message; can be switched to fail
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub written: Arc<Mutex<Vec<Vec<u8>>>>,
    pub fail: Arc<Mutex<bool>>,
}

impl ProtocolSink for RecordingSink {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), SinkError> {
        if *self.fail.lock() {
            return Err(SinkError::Send("forced failure".to_string()));
        }
        self.written.lock().push(bytes.to_vec());
        Ok(())
    }
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<Vec<u8>> {
        self.written.lock().clone()
    }
}

/// Surface that keeps every light write and counts flushes
///
/// `fail_lights` and `fail_flush` make the matching calls return errors; the
/// calls are still counted.
#[derive(Clone, Default)]
pub struct RecordingSurface {
    pub lights: Arc<Mutex<Vec<(u32, FeedbackColor)>>>,
    pub flushes: Arc<Mutex<usize>>,
    pub attempts: Arc<Mutex<usize>>,
    pub fail_lights: Arc<Mutex<bool>>,
    pub fail_flush: Arc<Mutex<bool>>,
}

impl LightSurface for RecordingSurface {
    fn light_set(&mut self, id: u32, color: FeedbackColor) -> Result<(), SinkError> {
        *self.attempts.lock() += 1;
        if *self.fail_lights.lock() {
            return Err(SinkError::Send(format!("light {} unavailable", id)));
        }
        self.lights.lock().push((id, color));
        Ok(())
    }

    fn light_flush(&mut self) -> Result<(), SinkError> {
        *self.flushes.lock() += 1;
        if *self.fail_flush.lock() {
            return Err(SinkError::NotConnected);
        }
        Ok(())
    }
}

impl RecordingSurface {
    /// Take the lights written since the last call
    pub fn take(&self) -> Vec<(u32, FeedbackColor)> {
        std::mem::take(&mut *self.lights.lock())
    }

    pub fn flush_count(&self) -> usize {
        *self.flushes.lock()
    }

    /// Number of `light_set` calls, failed ones included
    pub fn attempt_count(&self) -> usize {
        *self.attempts.lock()
    }
}

/// A 16-pad controller with shift, group and fixed-velocity buttons
pub fn pad_layout(pads: u32) -> DeviceLayout {
    DeviceLayout {
        vendor: "Test".to_string(),
        device: "Pads".to_string(),
        grid: Some(GridInfo {
            id_offset: GRID_OFFSET,
            count: pads,
        }),
        controls: ControlCounts {
            buttons: 8,
            encoders: 1,
            sliders: 1,
            grids: pads,
        },
        mode_buttons: ModeButtons {
            shift: Some(SHIFT),
            group: Some(GROUP),
            fixed_velocity: Some(FIXED_VEL),
        },
        capabilities: Capabilities::default(),
    }
}

pub fn bridge_with_sink(layout: &DeviceLayout) -> (Bridge, RecordingSink) {
    let sink = RecordingSink::default();
    let bridge = Bridge::accept(layout, &BridgeSettings::default(), Box::new(sink.clone()))
        .expect("layout should be accepted");
    (bridge, sink)
}
