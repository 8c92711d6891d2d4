//! Device-facing types: typed input events, the layout reported at accept
//! time, and the collaborator traits the bridge writes through.
//!
//! USB/HID transport and per-model parsing live outside this crate. A device
//! layer hands over ordered batches of [`Event`]s and accepts protocol bytes
//! through a [`ProtocolSink`] and light writes through a [`LightSurface`].

pub mod source;

use serde::{Deserialize, Serialize};

use crate::color::FeedbackColor;
use crate::error::SinkError;

pub use source::{ChannelSource, EventSource, ScriptSource};

/// Typed input event delivered by the device layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Event {
    Button { id: u32, pressed: bool },
    Encoder { delta: i32 },
    Slider { id: u32, value: f32 },
    Grid { pos: u32, pressed: bool, pressure: f32 },
}

/// Light id range of a pad grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridInfo {
    /// Light id of pad 0
    pub id_offset: u32,
    /// Number of pads
    pub count: u32,
}

impl GridInfo {
    /// Build from a `[first, end)` light id range as devices usually report it
    pub fn from_id_range(first: u32, end: u32) -> Self {
        Self {
            id_offset: first,
            count: end.saturating_sub(first),
        }
    }
}

/// Control counts per event kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ControlCounts {
    #[serde(default)]
    pub buttons: u32,
    #[serde(default)]
    pub encoders: u32,
    #[serde(default)]
    pub sliders: u32,
    #[serde(default)]
    pub grids: u32,
}

impl ControlCounts {
    pub fn total(&self) -> u32 {
        self.buttons
            .saturating_add(self.encoders)
            .saturating_add(self.sliders)
            .saturating_add(self.grids)
    }
}

/// Button ids that drive the modal overlays instead of emitting messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModeButtons {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_velocity: Option<u32>,
}

/// What a device variant supports
///
/// One translator serves every device generation; these switches select
/// the overlays and pad behaviour that exist on a given surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Shift + pad selects the MIDI channel
    #[serde(default = "default_true")]
    pub has_channels: bool,
    /// A fixed-velocity toggle button exists
    #[serde(default = "default_true")]
    pub has_fixed_velocity: bool,
    /// Pad lights follow the physical press; when false they latch per press
    #[serde(default = "default_true")]
    pub auto_clear_on_release: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            has_channels: true,
            has_fixed_velocity: true,
            auto_clear_on_release: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Layout information read once when a device is accepted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceLayout {
    #[serde(default)]
    pub vendor: String,
    pub device: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<GridInfo>,
    #[serde(default)]
    pub controls: ControlCounts,
    #[serde(default)]
    pub mode_buttons: ModeButtons,
    #[serde(default)]
    pub capabilities: Capabilities,
}

impl DeviceLayout {
    /// "vendor device" label used in logs
    pub fn label(&self) -> String {
        if self.vendor.is_empty() {
            self.device.clone()
        } else {
            format!("{} {}", self.vendor, self.device)
        }
    }

    /// The grid, if the device reports one with at least one pad
    pub fn usable_grid(&self) -> Option<GridInfo> {
        if self.controls.grids == 0 {
            return None;
        }
        self.grid.filter(|g| g.count > 0)
    }
}

/// Destination for emitted 3-byte protocol messages
pub trait ProtocolSink: Send {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), SinkError>;
}

/// Per-control light output of a device
pub trait LightSurface: Send {
    fn light_set(&mut self, id: u32, color: FeedbackColor) -> Result<(), SinkError>;

    /// Push all pending light writes to the hardware
    fn light_flush(&mut self) -> Result<(), SinkError>;
}

/// Hooks the device layer calls for one accepted device
pub trait DeviceHandler: Send {
    /// Handle one ordered batch of input events
    fn on_event(&mut self, batch: &[Event]);

    /// Recompute and write the feedback surface
    fn on_feedback(&mut self, surface: &mut dyn LightSurface);

    /// Release everything owned for the device; later calls are no-ops
    fn on_remove(&mut self, unexpected: bool);

    /// Snapshot of the handler's mode for diagnostics
    ///
    /// Default implementation: no status to report
    fn status(&self) -> Option<DeviceStatus> {
        None
    }
}

/// Diagnostic view of a device's mode state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceStatus {
    pub label: String,
    pub overlay: String,
    pub group_id: u8,
    pub max_groups: u8,
    pub channel: u8,
    pub channel_value: u8,
    pub fixed_velocity: bool,
    pub pads_lit: usize,
    /// Highest pressure among lit pads
    pub peak_pressure: f32,
}
