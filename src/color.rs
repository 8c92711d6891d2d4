//! Packed LED color used by the feedback surface
//!
//! Layout: bit 31 = blink, bits 30..24 = brightness (0-127), bits 23..0 = RGB.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A packed feedback color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedbackColor(pub u32);

const BLINK_BIT: u32 = 1 << 31;
const BRIGHTNESS_SHIFT: u32 = 24;
const BRIGHTNESS_MASK: u32 = 0x7F;
const RGB_MASK: u32 = 0x00FF_FFFF;

impl FeedbackColor {
    /// Light off
    pub const OFF: FeedbackColor = FeedbackColor(0);

    /// Every bit set: blinking, full brightness, white
    pub const FULL: FeedbackColor = FeedbackColor(0xFFFF_FFFF);

    /// Highlight used for the selected channel slot
    pub const CHANNEL_ACTIVE: FeedbackColor = FeedbackColor(0xFF00_FF00);

    /// Default lit pad color
    pub const DEFAULT_GRID: FeedbackColor = FeedbackColor(0xFF00_40FF);

    /// Plain RGB with blink off and brightness 0
    pub const fn rgb(rgb: u32) -> Self {
        FeedbackColor(rgb & RGB_MASK)
    }

    pub fn blink(self) -> bool {
        self.0 & BLINK_BIT != 0
    }

    pub fn brightness(self) -> u8 {
        ((self.0 >> BRIGHTNESS_SHIFT) & BRIGHTNESS_MASK) as u8
    }

    pub fn rgb_bits(self) -> u32 {
        self.0 & RGB_MASK
    }

    /// Split into (r, g, b)
    pub fn channels(self) -> (u8, u8, u8) {
        (
            (self.0 >> 16) as u8,
            (self.0 >> 8) as u8,
            self.0 as u8,
        )
    }

    /// Same color with blink on and full brightness
    pub fn highlighted(self) -> Self {
        FeedbackColor(self.0 | BLINK_BIT | (BRIGHTNESS_MASK << BRIGHTNESS_SHIFT))
    }
}

impl From<u32> for FeedbackColor {
    fn from(raw: u32) -> Self {
        FeedbackColor(raw)
    }
}

impl fmt::Display for FeedbackColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (r, g, b) = self.channels();
        write!(
            f,
            "blink[{}] bright[{}] rgb[{:02X}{:02X}{:02X}]",
            self.blink() as u8,
            self.brightness(),
            r,
            g,
            b
        )
    }
}

/// Per-group slot colors shown while the group overlay is held
pub const GROUP_PALETTE: [FeedbackColor; 7] = [
    FeedbackColor::rgb(0x0000_00FF),
    FeedbackColor::rgb(0x0000_FF00),
    FeedbackColor::rgb(0x00FF_0000),
    FeedbackColor::rgb(0x00FF_00FF),
    FeedbackColor::rgb(0x00FF_FF00),
    FeedbackColor::rgb(0x0000_FFFF),
    FeedbackColor::rgb(0x00FF_FFFF),
];

/// Palette color for a group slot; cycles when a device has more groups than colors
pub fn group_color(slot: usize) -> FeedbackColor {
    GROUP_PALETTE[slot % GROUP_PALETTE.len()]
}

/// Parse a color from config or environment: decimal or `0x`-prefixed hex
pub fn parse_color(text: &str) -> Option<FeedbackColor> {
    let text = text.trim();
    let parsed = if let Some(hex) = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .or_else(|| text.strip_prefix('#'))
    {
        u32::from_str_radix(&hex.replace('_', ""), 16).ok()
    } else {
        text.parse::<u32>().ok()
    };
    parsed.map(FeedbackColor)
}
