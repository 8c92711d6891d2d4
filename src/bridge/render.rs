//! Feedback rendering: mode and pad state to per-control LED colors
//!
//! Rendering is read-only and bounded: a frame holds at most one indicator
//! plus one entry per grid slot, stored inline.

use super::mode::{ModeState, Overlay};
use super::store::{GridState, GRID_CAPACITY};
use crate::color::{self, FeedbackColor};
use crate::device::{GridInfo, LightSurface};
use crate::error::SinkError;
use crate::midi::CHANNEL_COUNT;

/// Maximum number of lights one frame can carry
pub const FRAME_CAPACITY: usize = GRID_CAPACITY + 1;

/// Static inputs of the renderer, fixed at accept time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceLayout {
    pub grid: Option<GridInfo>,
    pub fixed_velocity_light: Option<u32>,
    pub grid_color: FeedbackColor,
}

/// One computed set of (control id, color) pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackFrame {
    lights: [(u32, FeedbackColor); FRAME_CAPACITY],
    len: usize,
}

impl FeedbackFrame {
    fn new() -> Self {
        Self {
            lights: [(0, FeedbackColor::OFF); FRAME_CAPACITY],
            len: 0,
        }
    }

    fn push(&mut self, id: u32, color: FeedbackColor) {
        if self.len < FRAME_CAPACITY {
            self.lights[self.len] = (id, color);
            self.len += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &(u32, FeedbackColor)> {
        self.lights[..self.len].iter()
    }

    /// Color assigned to a control id in this frame
    pub fn color_of(&self, id: u32) -> Option<FeedbackColor> {
        self.iter().find(|(light, _)| *light == id).map(|(_, c)| *c)
    }

    /// Write every light, then flush once. Returns the number of failed writes.
    ///
    /// A failed light write does not stop the frame; the flush is attempted regardless.
    pub fn write_to(&self, surface: &mut dyn LightSurface) -> Result<usize, SinkError> {
        let mut failed = 0;
        for &(id, color) in self.iter() {
            if surface.light_set(id, color).is_err() {
                failed += 1;
            }
        }
        surface.light_flush()?;
        Ok(failed)
    }
}

/// Compute the lights for the current state
pub fn render(mode: &ModeState, grid: Option<&GridState>, layout: &SurfaceLayout) -> FeedbackFrame {
    let mut frame = FeedbackFrame::new();

    if let Some(id) = layout.fixed_velocity_light {
        let color = if mode.fixed_velocity() {
            FeedbackColor::FULL
        } else {
            FeedbackColor::OFF
        };
        frame.push(id, color);
    }

    let (info, grid) = match (layout.grid, grid) {
        (Some(info), Some(grid)) => (info, grid),
        _ => return frame,
    };
    let pads = grid.pads_count();
    let light = |slot: usize| info.id_offset.saturating_add(slot as u32);

    match mode.overlay() {
        Overlay::GroupSelect => {
            let slots = (mode.max_groups() as usize).min(pads);
            for slot in 0..slots {
                let mut color = color::group_color(slot);
                if slot == mode.group_id() as usize {
                    color = color.highlighted();
                }
                frame.push(light(slot), color);
            }
        }
        Overlay::ChannelSelect => {
            for slot in 0..CHANNEL_COUNT.min(pads) {
                let color = if slot == mode.channel() as usize {
                    FeedbackColor::CHANNEL_ACTIVE
                } else {
                    FeedbackColor::OFF
                };
                frame.push(light(slot), color);
            }
        }
        Overlay::Normal => {
            for slot in 0..pads {
                let color = if grid.is_pressed(slot) {
                    layout.grid_color
                } else {
                    FeedbackColor::OFF
                };
                frame.push(light(slot), color);
            }
        }
    }

    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::mode::ModeControl;

    fn layout() -> SurfaceLayout {
        SurfaceLayout {
            grid: Some(GridInfo {
                id_offset: 40,
                count: 16,
            }),
            fixed_velocity_light: Some(7),
            grid_color: FeedbackColor::DEFAULT_GRID,
        }
    }

    #[test]
    fn test_normal_shows_pressed_pads() {
        let mode = ModeState::new(6, true);
        let mut grid = GridState::new(16);
        grid.record(2, true, 0.5);

        let frame = render(&mode, Some(&grid), &layout());
        assert_eq!(frame.len(), 17);
        assert_eq!(frame.color_of(7), Some(FeedbackColor::OFF));
        assert_eq!(frame.color_of(42), Some(FeedbackColor::DEFAULT_GRID));
        assert_eq!(frame.color_of(43), Some(FeedbackColor::OFF));
    }

    #[test]
    fn test_fixed_velocity_indicator() {
        let mut mode = ModeState::new(6, true);
        mode.apply(ModeControl::FixedVelocity, true);
        let frame = render(&mode, None, &layout());
        assert_eq!(frame.len(), 1);
        assert_eq!(frame.color_of(7), Some(FeedbackColor::FULL));
    }

    #[test]
    fn test_group_overlay_highlights_selected() {
        let mut mode = ModeState::new(6, true);
        mode.apply(ModeControl::Group, true);
        mode.select_group(2);
        let grid = GridState::new(16);

        let frame = render(&mode, Some(&grid), &layout());
        assert_eq!(frame.len(), 1 + 6);
        assert_eq!(frame.color_of(40), Some(color::GROUP_PALETTE[0]));
        assert_eq!(frame.color_of(42), Some(FeedbackColor(0xFFFF_0000)));
        assert_eq!(frame.color_of(46), None);
    }

    #[test]
    fn test_channel_overlay() {
        let mut mode = ModeState::new(6, true);
        mode.apply(ModeControl::Shift, true);
        mode.select_channel(3);
        let grid = GridState::new(8);

        let frame = render(&mode, Some(&grid), &layout());
        assert_eq!(frame.len(), 1 + 8);
        assert_eq!(frame.color_of(43), Some(FeedbackColor::CHANNEL_ACTIVE));
        assert_eq!(frame.color_of(40), Some(FeedbackColor::OFF));
    }

    #[test]
    fn test_group_wins_over_channel() {
        let mut mode = ModeState::new(6, true);
        mode.apply(ModeControl::Shift, true);
        mode.apply(ModeControl::Group, true);
        let grid = GridState::new(16);

        let frame = render(&mode, Some(&grid), &layout());
        assert_eq!(frame.color_of(41), Some(color::GROUP_PALETTE[1]));
    }

    #[test]
    fn test_render_is_idempotent() {
        let mut mode = ModeState::new(6, true);
        mode.apply(ModeControl::FixedVelocity, true);
        let mut grid = GridState::new(16);
        grid.record(0, true, 1.0);
        grid.record(15, true, 0.3);

        let first = render(&mode, Some(&grid), &layout());
        let second = render(&mode, Some(&grid), &layout());
        assert_eq!(first, second);
    }
}
