//! MIDI protocol messages emitted by the bridge
//!
//! Every message the bridge writes is a 3-byte channel voice message:
//! status (kind nibble | channel nibble), data1 and data2.

use std::fmt;

/// Status nibble for Note Off
pub const STATUS_NOTE_OFF: u8 = 0x80;
/// Status nibble for Note On
pub const STATUS_NOTE_ON: u8 = 0x90;
/// Status nibble for Control Change
pub const STATUS_CONTROL_CHANGE: u8 = 0xB0;

/// Highest value a 7-bit data byte can carry
pub const MAX_DATA: u8 = 127;

/// Number of MIDI channels
pub const CHANNEL_COUNT: usize = 16;

/// Outgoing protocol message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    /// Note Off: channel (0-15), note (0-127), velocity (0-127)
    NoteOff { channel: u8, note: u8, velocity: u8 },

    /// Note On: channel (0-15), note (0-127), velocity (0-127)
    NoteOn { channel: u8, note: u8, velocity: u8 },

    /// Control Change: channel (0-15), cc (0-127), value (0-127)
    ControlChange { channel: u8, cc: u8, value: u8 },
}

impl MidiMessage {
    /// Parse a 3-byte channel message. Only the kinds the bridge emits are recognised.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < 3 || data[0] < 0x80 || data[0] >= 0xF0 {
            return None;
        }

        let channel = data[0] & 0x0F;
        let data1 = data[1] & 0x7F;
        let data2 = data[2] & 0x7F;

        match data[0] & 0xF0 {
            STATUS_NOTE_OFF => Some(MidiMessage::NoteOff {
                channel,
                note: data1,
                velocity: data2,
            }),
            STATUS_NOTE_ON => Some(MidiMessage::NoteOn {
                channel,
                note: data1,
                velocity: data2,
            }),
            STATUS_CONTROL_CHANGE => Some(MidiMessage::ControlChange {
                channel,
                cc: data1,
                value: data2,
            }),
            _ => None,
        }
    }

    /// Encode to wire bytes. Out-of-range fields are masked, never carried into the status.
    pub fn to_bytes(&self) -> [u8; 3] {
        match *self {
            MidiMessage::NoteOff { channel, note, velocity } => {
                [STATUS_NOTE_OFF | (channel & 0x0F), note & 0x7F, velocity & 0x7F]
            }
            MidiMessage::NoteOn { channel, note, velocity } => {
                [STATUS_NOTE_ON | (channel & 0x0F), note & 0x7F, velocity & 0x7F]
            }
            MidiMessage::ControlChange { channel, cc, value } => {
                [STATUS_CONTROL_CHANGE | (channel & 0x0F), cc & 0x7F, value & 0x7F]
            }
        }
    }

    /// Channel of the message (0-15)
    pub fn channel(&self) -> u8 {
        match *self {
            MidiMessage::NoteOff { channel, .. }
            | MidiMessage::NoteOn { channel, .. }
            | MidiMessage::ControlChange { channel, .. } => channel,
        }
    }
}

impl fmt::Display for MidiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MidiMessage::NoteOff { channel, note, velocity } => {
                write!(f, "NoteOff ch:{} n:{} v:{}", channel + 1, note, velocity)
            }
            MidiMessage::NoteOn { channel, note, velocity } => {
                write!(f, "NoteOn ch:{} n:{} v:{}", channel + 1, note, velocity)
            }
            MidiMessage::ControlChange { channel, cc, value } => {
                write!(f, "CC ch:{} cc:{} v:{}", channel + 1, cc, value)
            }
        }
    }
}

/// Value conversion utilities
pub mod convert {
    use super::MAX_DATA;

    /// Clamp a unit float to [0, 1]. NaN maps to 0.
    pub fn clamp_unit(value: f32) -> f32 {
        if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 1.0)
        }
    }

    /// Scale a unit float to a 7-bit value, flooring (0.5 -> 63)
    pub fn unit_to_7bit(value: f32) -> u8 {
        (clamp_unit(value) * MAX_DATA as f32) as u8
    }

    /// Add a base and an index, saturating at the 7-bit maximum
    pub fn offset_7bit(base: u8, index: u32) -> u8 {
        let sum = (base as u32).saturating_add(index);
        sum.min(MAX_DATA as u32) as u8
    }
}

/// Format MIDI bytes as hex string for debugging
pub fn format_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_on_encoding() {
        let msg = MidiMessage::NoteOn {
            channel: 0,
            note: 29,
            velocity: 63,
        };

        assert_eq!(msg.to_bytes(), [0x90, 29, 63]);
    }

    #[test]
    fn test_channel_in_status_nibble() {
        let msg = MidiMessage::ControlChange {
            channel: 5,
            cc: 2,
            value: 4,
        };

        assert_eq!(msg.to_bytes(), [0xB5, 2, 4]);
        assert_eq!(msg.channel(), 5);
    }

    #[test]
    fn test_parse_control_change() {
        let msg = MidiMessage::parse(&[0xB2, 7, 100]).unwrap();

        assert_eq!(
            msg,
            MidiMessage::ControlChange {
                channel: 2,
                cc: 7,
                value: 100,
            }
        );
    }

    #[test]
    fn test_parse_rejects_system_and_short() {
        assert_eq!(MidiMessage::parse(&[0xF8, 0, 0]), None);
        assert_eq!(MidiMessage::parse(&[0x90, 60]), None);
        assert_eq!(MidiMessage::parse(&[0x40, 60, 1]), None);
    }

    #[test]
    fn test_unit_to_7bit_floors() {
        assert_eq!(convert::unit_to_7bit(0.0), 0);
        assert_eq!(convert::unit_to_7bit(0.5), 63);
        assert_eq!(convert::unit_to_7bit(1.0), 127);
        assert_eq!(convert::unit_to_7bit(1.5), 127);
        assert_eq!(convert::unit_to_7bit(-0.2), 0);
        assert_eq!(convert::unit_to_7bit(f32::NAN), 0);
    }

    #[test]
    fn test_offset_saturates() {
        assert_eq!(convert::offset_7bit(60, 5), 65);
        assert_eq!(convert::offset_7bit(60, 500), 127);
    }

    #[test]
    fn test_format_hex() {
        assert_eq!(format_hex(&[0x90, 0x1D, 0x3F]), "90 1D 3F");
    }
}
