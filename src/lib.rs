//! padbridge - modal pad controller to MIDI bridge
//!
//! Translates button, encoder, slider and pad events from a controller into
//! MIDI messages, with shift and group overlays that turn the pad grid into
//! channel and note-group selectors, and renders LED feedback for the
//! current mode.

pub mod bridge;
pub mod cli;
pub mod color;
pub mod config;
pub mod device;
pub mod error;
pub mod midi;
pub mod output;
pub mod runtime;

#[cfg(test)]
mod testing;

pub use bridge::{Bridge, BridgeSettings};
pub use error::{AcceptError, BridgeError, SinkError};
