//! Bridge module - modal translation and feedback for one controller
//!
//! A [`Bridge`] is created when a device is accepted and owns everything for
//! that device exclusively:
//! - Mode state (overlays, selected group and channel, accumulators)
//! - Pad state of the grid, if the device has one
//! - The protocol sink messages are written to
//!
//! Event batches and feedback ticks must be serialized per bridge; the
//! runtime does this by confining each bridge to one actor task.

mod mode;
mod render;
mod store;
mod translate;


pub use mode::{max_groups_for, ModeControl, ModeControls, ModeState, Overlay};
pub use render::{render, FeedbackFrame, SurfaceLayout, FRAME_CAPACITY};
pub use store::{ChannelValues, GridState, GRID_CAPACITY};
pub use translate::{translate, PadGrid, Routing};

use tracing::{debug, info, warn};

use crate::color::FeedbackColor;
use crate::device::{
    Capabilities, DeviceHandler, DeviceLayout, DeviceStatus, Event, LightSurface, ProtocolSink,
};
use crate::error::AcceptError;
use crate::midi::{format_hex, MidiMessage};

/// Per-bridge tunables taken from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeSettings {
    pub routing: Routing,
    pub grid_color: FeedbackColor,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            routing: Routing::default(),
            grid_color: FeedbackColor::DEFAULT_GRID,
        }
    }
}

/// Translation and feedback state of one accepted device
pub struct Bridge {
    label: String,
    controls: ModeControls,
    caps: Capabilities,
    routing: Routing,
    surface: SurfaceLayout,
    mode: ModeState,
    grid: Option<GridState>,
    sink: Option<Box<dyn ProtocolSink>>,
    write_failures: u64,
}

impl Bridge {
    /// Validate a device layout and build its bridge
    pub fn accept(
        layout: &DeviceLayout,
        settings: &BridgeSettings,
        sink: Box<dyn ProtocolSink>,
    ) -> Result<Self, AcceptError> {
        let label = layout.label();
        let grid_info = layout.usable_grid();

        if layout.controls.total() == 0 && grid_info.is_none() {
            return Err(AcceptError::NoControls(label));
        }
        check_mode_buttons(layout)?;

        let grid = match grid_info {
            Some(info) => {
                if info.count as usize > GRID_CAPACITY {
                    warn!(
                        "{}: grid reports {} pads, tracking the first {}",
                        label, info.count, GRID_CAPACITY
                    );
                }
                Some(GridState::new(info.count as usize))
            }
            None => {
                warn!("{}: no pad grid reported, grid features disabled", label);
                None
            }
        };

        let max_groups = grid
            .as_ref()
            .map(|g| max_groups_for(g.pads_count(), settings.routing.starting_note))
            .unwrap_or(1);
        let controls = ModeControls::new(&layout.mode_buttons, &layout.capabilities);

        info!(
            "Accepting {} (pads: {}, groups: {})",
            label,
            grid.as_ref().map(|g| g.pads_count()).unwrap_or(0),
            max_groups
        );

        Ok(Self {
            label,
            controls,
            caps: layout.capabilities,
            routing: settings.routing,
            surface: SurfaceLayout {
                grid: grid_info,
                fixed_velocity_light: controls.fixed_velocity_light(),
                grid_color: settings.grid_color,
            },
            mode: ModeState::new(max_groups, layout.capabilities.has_channels),
            grid,
            sink: Some(sink),
            write_failures: 0,
        })
    }

    /// Run one event through the mode machine and translator, without writing
    pub fn handle(&mut self, event: &Event) -> Option<MidiMessage> {
        if let Event::Button { id, pressed } = *event {
            if let Some(control) = self.controls.classify(id) {
                self.mode.apply(control, pressed);
                return None;
            }
        }

        let auto_clear = self.caps.auto_clear_on_release;
        let grid = self.grid.as_mut().map(|state| PadGrid { state, auto_clear });
        translate(event, &mut self.mode, grid, &self.routing)
    }

    /// Compute the current feedback frame
    pub fn render(&self) -> FeedbackFrame {
        render(&self.mode, self.grid.as_ref(), &self.surface)
    }

    fn emit(&mut self, msg: MidiMessage) {
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        let bytes = msg.to_bytes();
        match sink.write_bytes(&bytes) {
            Ok(()) => debug!("→ {} | {}", format_hex(&bytes), msg),
            Err(e) => {
                self.write_failures += 1;
                warn!("{}: failed to write {}: {}", self.label, msg, e);
            }
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn mode(&self) -> &ModeState {
        &self.mode
    }

    pub fn grid(&self) -> Option<&GridState> {
        self.grid.as_ref()
    }

    pub fn has_grid(&self) -> bool {
        self.grid.is_some()
    }

    pub fn is_removed(&self) -> bool {
        self.sink.is_none()
    }

    /// Protocol writes that failed since accept
    pub fn write_failures(&self) -> u64 {
        self.write_failures
    }
}

fn check_mode_buttons(layout: &DeviceLayout) -> Result<(), AcceptError> {
    let buttons = &layout.mode_buttons;
    let roles = [
        ("shift", buttons.shift),
        ("group", buttons.group),
        ("fixed_velocity", buttons.fixed_velocity),
    ];
    for (i, (role, id)) in roles.iter().enumerate() {
        let Some(id) = id else { continue };
        if roles[..i].iter().any(|(_, other)| *other == Some(*id)) {
            return Err(AcceptError::ModeButtonCollision {
                role: *role,
                id: *id,
            });
        }
    }
    Ok(())
}

impl DeviceHandler for Bridge {
    fn on_event(&mut self, batch: &[Event]) {
        if self.is_removed() {
            return;
        }
        for event in batch {
            if let Some(msg) = self.handle(event) {
                self.emit(msg);
            }
        }
    }

    fn on_feedback(&mut self, surface: &mut dyn LightSurface) {
        if self.is_removed() {
            return;
        }
        match self.render().write_to(surface) {
            Ok(0) => {}
            Ok(failed) => warn!("{}: {} light writes failed", self.label, failed),
            Err(e) => warn!("{}: light flush failed: {}", self.label, e),
        }
    }

    fn on_remove(&mut self, unexpected: bool) {
        if self.sink.take().is_none() {
            return;
        }
        if let Some(grid) = self.grid.as_mut() {
            grid.clear();
        }
        if unexpected {
            warn!("Removing {} (unexpected disconnect)", self.label);
        } else {
            info!("Removing {}", self.label);
        }
    }

    fn status(&self) -> Option<DeviceStatus> {
        let lit: Vec<usize> = self
            .grid
            .as_ref()
            .map(|g| (0..g.pads_count()).filter(|&i| g.is_pressed(i)).collect())
            .unwrap_or_default();
        let peak_pressure = self
            .grid
            .as_ref()
            .map(|g| lit.iter().map(|&i| g.pressure(i)).fold(0.0, f32::max))
            .unwrap_or(0.0);
        Some(DeviceStatus {
            label: self.label.clone(),
            overlay: format!("{:?}", self.mode.overlay()),
            group_id: self.mode.group_id(),
            max_groups: self.mode.max_groups(),
            channel: self.mode.channel(),
            channel_value: self.mode.channel_value(self.mode.channel()),
            fixed_velocity: self.mode.fixed_velocity(),
            pads_lit: lit.len(),
            peak_pressure,
        })
    }
}
