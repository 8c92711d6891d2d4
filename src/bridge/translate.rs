//! Event-to-protocol translation
//!
//! Turns one non-mode event into at most one MIDI message, given the current
//! mode and stores. Grid presses under an overlay update the selection instead.

use serde::{Deserialize, Serialize};

use super::mode::{ModeState, Overlay};
use super::store::GridState;
use crate::device::Event;
use crate::midi::{convert, MidiMessage, MAX_DATA};

/// Controller and note numbers used for emission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Routing {
    /// Note of pad 0 in group 0
    #[serde(default = "default_starting_note")]
    pub starting_note: u8,
    /// Controller number of button 0
    #[serde(default = "default_button_cc_base")]
    pub button_cc_base: u8,
    /// Controller number carrying the encoder accumulator
    #[serde(default = "default_encoder_cc")]
    pub encoder_cc: u8,
    /// Controller number of slider 0
    #[serde(default)]
    pub slider_cc_base: u8,
}

impl Default for Routing {
    fn default() -> Self {
        Self {
            starting_note: default_starting_note(),
            button_cc_base: default_button_cc_base(),
            encoder_cc: default_encoder_cc(),
            slider_cc_base: 0,
        }
    }
}

fn default_starting_note() -> u8 {
    24
}
fn default_button_cc_base() -> u8 {
    60
}
fn default_encoder_cc() -> u8 {
    2
}

/// Pad store together with its lighting behaviour
pub struct PadGrid<'a> {
    pub state: &'a mut GridState,
    /// Lit flag follows press/release; latches per press when false
    pub auto_clear: bool,
}

/// Translate a non-mode event. Returns the message to emit, if any.
pub fn translate(
    event: &Event,
    mode: &mut ModeState,
    grid: Option<PadGrid<'_>>,
    routing: &Routing,
) -> Option<MidiMessage> {
    let channel = mode.channel();

    match *event {
        Event::Button { id, pressed } => Some(MidiMessage::ControlChange {
            channel,
            cc: convert::offset_7bit(routing.button_cc_base, id),
            value: if pressed { MAX_DATA } else { 0 },
        }),

        Event::Encoder { delta } => {
            let value = mode.accumulate(delta);
            Some(MidiMessage::ControlChange {
                channel,
                cc: routing.encoder_cc.min(MAX_DATA),
                value,
            })
        }

        Event::Slider { id, value } => Some(MidiMessage::ControlChange {
            channel,
            cc: convert::offset_7bit(routing.slider_cc_base, id),
            value: convert::unit_to_7bit(value),
        }),

        Event::Grid {
            pos,
            pressed,
            pressure,
        } => {
            let grid = grid?;
            match mode.overlay() {
                Overlay::GroupSelect => {
                    mode.select_group(pos);
                    None
                }
                Overlay::ChannelSelect => {
                    mode.select_channel(pos);
                    None
                }
                Overlay::Normal => Some(play_pad(mode, grid, routing, pos, pressed, pressure)),
            }
        }
    }
}

fn play_pad(
    mode: &ModeState,
    grid: PadGrid<'_>,
    routing: &Routing,
    pos: u32,
    pressed: bool,
    pressure: f32,
) -> MidiMessage {
    let pos = grid.state.clamp_pos(pos);
    if grid.auto_clear {
        grid.state.record(pos, pressed, pressure);
    } else if pressed {
        grid.state.toggle(pos, pressure);
    }

    let pads = grid.state.pads_count() as u32;
    let index = (mode.group_id() as u32)
        .saturating_mul(pads)
        .saturating_add(pos as u32);
    let note = convert::offset_7bit(routing.starting_note, index);
    let channel = mode.channel();

    if pressed {
        let velocity = if mode.fixed_velocity() {
            MAX_DATA
        } else {
            convert::unit_to_7bit(pressure)
        };
        MidiMessage::NoteOn {
            channel,
            note,
            velocity,
        }
    } else {
        MidiMessage::NoteOff {
            channel,
            note,
            velocity: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::mode::ModeControl;

    fn pad(pos: u32, pressed: bool, pressure: f32) -> Event {
        Event::Grid {
            pos,
            pressed,
            pressure,
        }
    }

    #[test]
    fn test_button_cc() {
        let mut mode = ModeState::new(6, true);
        let msg = translate(
            &Event::Button { id: 5, pressed: true },
            &mut mode,
            None,
            &Routing::default(),
        );
        assert_eq!(msg.map(|m| m.to_bytes()), Some([0xB0, 65, 127]));

        let msg = translate(
            &Event::Button { id: 5, pressed: false },
            &mut mode,
            None,
            &Routing::default(),
        );
        assert_eq!(msg.map(|m| m.to_bytes()), Some([0xB0, 65, 0]));
    }

    #[test]
    fn test_slider_uses_slider_id() {
        let mut mode = ModeState::new(6, true);
        let msg = translate(
            &Event::Slider { id: 3, value: 2.0 },
            &mut mode,
            None,
            &Routing::default(),
        );
        assert_eq!(msg.map(|m| m.to_bytes()), Some([0xB0, 3, 127]));
    }

    #[test]
    fn test_grid_without_pads_is_noop() {
        let mut mode = ModeState::new(6, true);
        let msg = translate(&pad(1, true, 1.0), &mut mode, None, &Routing::default());
        assert_eq!(msg, None);
    }

    #[test]
    fn test_note_release_and_fixed_velocity() {
        let mut mode = ModeState::new(6, true);
        let mut grid = GridState::new(16);
        mode.apply(ModeControl::FixedVelocity, true);

        let on = translate(
            &pad(0, true, 0.1),
            &mut mode,
            Some(PadGrid { state: &mut grid, auto_clear: true }),
            &Routing::default(),
        );
        assert_eq!(on.map(|m| m.to_bytes()), Some([0x90, 24, 127]));
        assert!(grid.is_pressed(0));

        let off = translate(
            &pad(0, false, 0.0),
            &mut mode,
            Some(PadGrid { state: &mut grid, auto_clear: true }),
            &Routing::default(),
        );
        assert_eq!(off.map(|m| m.to_bytes()), Some([0x80, 24, 0]));
        assert!(!grid.is_pressed(0));
    }

    #[test]
    fn test_latching_pad_keeps_light_on_release() {
        let mut mode = ModeState::new(6, true);
        let mut grid = GridState::new(16);

        for pressed in [true, false] {
            translate(
                &pad(4, pressed, 0.8),
                &mut mode,
                Some(PadGrid { state: &mut grid, auto_clear: false }),
                &Routing::default(),
            );
        }
        assert!(grid.is_pressed(4));

        translate(
            &pad(4, true, 0.8),
            &mut mode,
            Some(PadGrid { state: &mut grid, auto_clear: false }),
            &Routing::default(),
        );
        assert!(!grid.is_pressed(4));
    }

    #[test]
    fn test_out_of_range_pad_is_clamped() {
        let mut mode = ModeState::new(6, true);
        let mut grid = GridState::new(16);
        let msg = translate(
            &pad(99, true, 1.0),
            &mut mode,
            Some(PadGrid { state: &mut grid, auto_clear: true }),
            &Routing::default(),
        );
        assert_eq!(msg.map(|m| m.to_bytes()), Some([0x90, 39, 127]));
        assert!(grid.is_pressed(15));
    }

    #[test]
    fn test_channel_select_then_emit_on_channel() {
        let mut mode = ModeState::new(6, true);
        let mut grid = GridState::new(16);

        mode.apply(ModeControl::Shift, true);
        let msg = translate(
            &pad(9, true, 1.0),
            &mut mode,
            Some(PadGrid { state: &mut grid, auto_clear: true }),
            &Routing::default(),
        );
        assert_eq!(msg, None);
        assert_eq!(mode.channel(), 9);
        assert!(!grid.is_pressed(9));
        mode.apply(ModeControl::Shift, false);

        let msg = translate(
            &Event::Encoder { delta: 3 },
            &mut mode,
            None,
            &Routing::default(),
        );
        assert_eq!(msg.map(|m| m.to_bytes()), Some([0xB9, 2, 3]));
    }

    #[test]
    fn test_note_saturates_at_127() {
        let mut mode = ModeState::new(20, true);
        let mut grid = GridState::new(64);
        mode.apply(ModeControl::Group, true);
        mode.select_group(19);
        mode.apply(ModeControl::Group, false);

        let msg = translate(
            &pad(63, true, 1.0),
            &mut mode,
            Some(PadGrid { state: &mut grid, auto_clear: true }),
            &Routing::default(),
        );
        assert_eq!(msg.map(|m| m.to_bytes()), Some([0x90, 127, 127]));
    }
}
