//! Output side of the bridge: MIDI port sink, logging light surface and a
//! discarding sink for dry runs.

use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use midir::{MidiOutput, MidiOutputConnection, MidiOutputPort};
use tracing::{debug, info};

use crate::color::FeedbackColor;
use crate::device::{LightSurface, ProtocolSink};
use crate::error::SinkError;
use crate::midi::{format_hex, MidiMessage};

/// Find an output port whose name contains `pattern` (case-insensitive)
fn find_output_port(midi_out: &MidiOutput, pattern: &str) -> Option<(MidiOutputPort, String)> {
    let needle = pattern.to_lowercase();
    midi_out.ports().into_iter().find_map(|port| {
        let name = midi_out.port_name(&port).ok()?;
        name.to_lowercase().contains(&needle).then_some((port, name))
    })
}

/// Names of every MIDI output port currently visible
pub fn list_output_ports(client_name: &str) -> Result<Vec<String>> {
    let midi_out = MidiOutput::new(client_name).context("Failed to create MIDI output client")?;
    Ok(midi_out
        .ports()
        .iter()
        .filter_map(|p| midi_out.port_name(p).ok())
        .collect())
}

/// Protocol sink writing to a MIDI output port
pub struct MidiOutputSink {
    port_name: String,
    conn: Option<MidiOutputConnection>,
}

// The connection is only touched from the actor that owns the bridge
unsafe impl Send for MidiOutputSink {}

impl MidiOutputSink {
    /// Open the first output port matching `pattern`
    pub fn open(pattern: &str, client_name: &str) -> Result<Self> {
        let midi_out =
            MidiOutput::new(client_name).context("Failed to create MIDI output client")?;

        let (port, port_name) = find_output_port(&midi_out, pattern)
            .ok_or_else(|| anyhow!("Output port '{}' not found", pattern))?;

        let conn = midi_out
            .connect(&port, client_name)
            .map_err(|e| anyhow!("Failed to connect to '{}': {}", port_name, e))?;

        info!("MIDI output opened: '{}'", port_name);
        Ok(Self {
            port_name,
            conn: Some(conn),
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Close the port; later writes fail with `NotConnected`
    pub fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            conn.close();
            info!("MIDI output closed: '{}'", self.port_name);
        }
    }
}

impl ProtocolSink for MidiOutputSink {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), SinkError> {
        let conn = self.conn.as_mut().ok_or(SinkError::NotConnected)?;
        conn.send(bytes)
            .map_err(|e| SinkError::Send(e.to_string()))
    }
}

impl Drop for MidiOutputSink {
    fn drop(&mut self) {
        self.close();
    }
}

/// Sink that decodes and logs messages without sending them anywhere
#[derive(Debug, Default)]
pub struct NullSink {
    written: u64,
}

impl NullSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn written(&self) -> u64 {
        self.written
    }
}

impl ProtocolSink for NullSink {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), SinkError> {
        self.written += 1;
        match MidiMessage::parse(bytes) {
            Some(msg) => info!("[dry-run] {}", msg),
            None => debug!("[dry-run] raw {}", format_hex(bytes)),
        }
        Ok(())
    }
}

/// Light surface that logs what changed at each flush
///
/// Writes are buffered until `light_flush`, like a real surface that pushes
/// one report per frame. Only lights whose color differs from the last
/// flushed value are logged.
#[derive(Debug, Default)]
pub struct ConsoleSurface {
    pending: Vec<(u32, FeedbackColor)>,
    shown: HashMap<u32, FeedbackColor>,
    last_changed: usize,
}

impl ConsoleSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Color last flushed for a light
    pub fn shown(&self, id: u32) -> Option<FeedbackColor> {
        self.shown.get(&id).copied()
    }

    /// Number of lights that changed on the most recent flush
    pub fn last_changed(&self) -> usize {
        self.last_changed
    }
}

impl LightSurface for ConsoleSurface {
    fn light_set(&mut self, id: u32, color: FeedbackColor) -> Result<(), SinkError> {
        self.pending.push((id, color));
        Ok(())
    }

    fn light_flush(&mut self) -> Result<(), SinkError> {
        self.last_changed = 0;
        for (id, color) in self.pending.drain(..) {
            if self.shown.insert(id, color) == Some(color) {
                continue;
            }
            self.last_changed += 1;
            let (r, g, b) = color.channels();
            info!(
                "light {:>3}: r={:>3} g={:>3} b={:>3} bright={:>3}{}",
                id,
                r,
                g,
                b,
                color.brightness(),
                if color.blink() { " blink" } else { "" }
            );
        }
        Ok(())
    }
}
