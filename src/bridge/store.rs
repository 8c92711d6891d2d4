//! Fixed-capacity per-device stores: pad state and per-channel accumulators

use crate::midi::{convert, CHANNEL_COUNT, MAX_DATA};

/// Maximum number of pads tracked per device
pub const GRID_CAPACITY: usize = 64;

/// Pressed/pressure state of every pad on one grid
#[derive(Debug, Clone, PartialEq)]
pub struct GridState {
    pad_pressed: [bool; GRID_CAPACITY],
    pad_pressure: [f32; GRID_CAPACITY],
    pads_count: usize,
}

impl GridState {
    /// Create a grid of `pads_count` pads, clamped to `1..=GRID_CAPACITY`
    pub fn new(pads_count: usize) -> Self {
        Self {
            pad_pressed: [false; GRID_CAPACITY],
            pad_pressure: [0.0; GRID_CAPACITY],
            pads_count: pads_count.clamp(1, GRID_CAPACITY),
        }
    }

    pub fn pads_count(&self) -> usize {
        self.pads_count
    }

    /// Clamp a device-reported position into the grid
    pub fn clamp_pos(&self, pos: u32) -> usize {
        (pos as usize).min(self.pads_count - 1)
    }

    /// Record a pad event. Pressure is clamped to [0, 1].
    pub fn record(&mut self, pos: usize, pressed: bool, pressure: f32) {
        if pos >= self.pads_count {
            return;
        }
        self.pad_pressed[pos] = pressed;
        self.pad_pressure[pos] = convert::clamp_unit(pressure);
    }

    /// Flip the lit flag of a pad (latching pads)
    pub fn toggle(&mut self, pos: usize, pressure: f32) {
        if pos >= self.pads_count {
            return;
        }
        self.pad_pressed[pos] = !self.pad_pressed[pos];
        self.pad_pressure[pos] = convert::clamp_unit(pressure);
    }

    pub fn is_pressed(&self, pos: usize) -> bool {
        pos < self.pads_count && self.pad_pressed[pos]
    }

    pub fn pressure(&self, pos: usize) -> f32 {
        if pos < self.pads_count {
            self.pad_pressure[pos]
        } else {
            0.0
        }
    }

    /// Release every pad
    pub fn clear(&mut self) {
        self.pad_pressed = [false; GRID_CAPACITY];
        self.pad_pressure = [0.0; GRID_CAPACITY];
    }
}

/// Accumulated encoder value for each MIDI channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelValues {
    values: [u8; CHANNEL_COUNT],
}

impl ChannelValues {
    pub fn get(&self, channel: u8) -> u8 {
        self.values[(channel as usize).min(CHANNEL_COUNT - 1)]
    }

    /// Add `step` to a channel's value, saturating into [0, 127]. Returns the new value.
    pub fn accumulate(&mut self, channel: u8, step: i32) -> u8 {
        let slot = &mut self.values[(channel as usize).min(CHANNEL_COUNT - 1)];
        let next = (*slot as i32).saturating_add(step).clamp(0, MAX_DATA as i32);
        *slot = next as u8;
        *slot
    }
}
