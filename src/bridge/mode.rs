//! Modal state machine: shift/group overlays, selected group and channel,
//! fixed-velocity toggle and per-channel encoder accumulators.

use tracing::trace;

use super::store::ChannelValues;
use crate::device::{Capabilities, ModeButtons};
use crate::midi::{CHANNEL_COUNT, MAX_DATA};

/// Which interpretation grid presses currently get
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    /// Pads play notes
    Normal,
    /// Group button held: pads pick the note group
    GroupSelect,
    /// Shift held: pads pick the MIDI channel
    ChannelSelect,
}

/// Role of a button that drives the mode machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeControl {
    Shift,
    Group,
    FixedVelocity,
}

/// Mode button ids resolved against the device capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeControls {
    shift: Option<u32>,
    group: Option<u32>,
    fixed_velocity: Option<u32>,
}

impl ModeControls {
    pub fn new(buttons: &ModeButtons, caps: &Capabilities) -> Self {
        Self {
            shift: buttons.shift,
            group: buttons.group,
            fixed_velocity: buttons.fixed_velocity.filter(|_| caps.has_fixed_velocity),
        }
    }

    /// Classify a button id. `None` means the button is an ordinary control.
    pub fn classify(&self, id: u32) -> Option<ModeControl> {
        if self.shift == Some(id) {
            Some(ModeControl::Shift)
        } else if self.group == Some(id) {
            Some(ModeControl::Group)
        } else if self.fixed_velocity == Some(id) {
            Some(ModeControl::FixedVelocity)
        } else {
            None
        }
    }

    /// Light id of the fixed-velocity indicator, if the surface has one
    pub fn fixed_velocity_light(&self) -> Option<u32> {
        self.fixed_velocity
    }
}

/// Number of note groups a grid can address above `starting_note`, at least 1
pub fn max_groups_for(pads_count: usize, starting_note: u8) -> u8 {
    let span = (MAX_DATA.saturating_sub(starting_note)) as usize;
    (span / pads_count.max(1)).clamp(1, u8::MAX as usize) as u8
}

/// Overlay flags and selections for one device
#[derive(Debug, Clone, PartialEq)]
pub struct ModeState {
    shift_held: bool,
    group_select_held: bool,
    group_id: u8,
    max_groups: u8,
    channel: u8,
    fixed_velocity: bool,
    channels_enabled: bool,
    values: ChannelValues,
}

impl ModeState {
    /// Fresh state in `Normal`. `max_groups` of 0 is raised to 1.
    pub fn new(max_groups: u8, channels_enabled: bool) -> Self {
        Self {
            shift_held: false,
            group_select_held: false,
            group_id: 0,
            max_groups: max_groups.max(1),
            channel: 0,
            fixed_velocity: false,
            channels_enabled,
            values: ChannelValues::default(),
        }
    }

    /// Apply a mode button press or release
    pub fn apply(&mut self, control: ModeControl, pressed: bool) {
        match control {
            ModeControl::Shift => self.shift_held = pressed,
            ModeControl::Group => self.group_select_held = pressed,
            ModeControl::FixedVelocity => {
                if pressed && self.overlay() == Overlay::Normal {
                    self.fixed_velocity = !self.fixed_velocity;
                }
            }
        }
        trace!(?control, pressed, overlay = ?self.overlay(), "mode control");
    }

    /// Current overlay. Group selection wins over channel selection.
    pub fn overlay(&self) -> Overlay {
        if self.group_select_held {
            Overlay::GroupSelect
        } else if self.shift_held && self.channels_enabled {
            Overlay::ChannelSelect
        } else {
            Overlay::Normal
        }
    }

    /// Select a group, clamping to the last one
    pub fn select_group(&mut self, pos: u32) {
        let last = (self.max_groups - 1) as u32;
        self.group_id = pos.min(last) as u8;
    }

    /// Select a channel, clamping to 15
    pub fn select_channel(&mut self, pos: u32) {
        self.channel = pos.min(CHANNEL_COUNT as u32 - 1) as u8;
    }

    /// Move the current channel's accumulator by `delta` encoder steps (x4 with shift)
    pub fn accumulate(&mut self, delta: i32) -> u8 {
        let step = if self.shift_held {
            delta.saturating_mul(4)
        } else {
            delta
        };
        self.values.accumulate(self.channel, step)
    }

    pub fn shift_held(&self) -> bool {
        self.shift_held
    }

    pub fn group_select_held(&self) -> bool {
        self.group_select_held
    }

    pub fn group_id(&self) -> u8 {
        self.group_id
    }

    pub fn max_groups(&self) -> u8 {
        self.max_groups
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn fixed_velocity(&self) -> bool {
        self.fixed_velocity
    }

    pub fn channel_value(&self, channel: u8) -> u8 {
        self.values.get(channel)
    }
}
