//! Configuration for padbridge
//!
//! Loaded once at startup from YAML. Every field has a default, so an empty
//! file (or no file at all) describes a 16-pad controller on a port whose
//! name contains "padbridge".

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::{info, warn};

use crate::bridge::{BridgeSettings, Routing, GRID_CAPACITY};
use crate::color::{parse_color, FeedbackColor};
use crate::device::{Capabilities, ControlCounts, DeviceLayout, GridInfo, ModeButtons};

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub midi: MidiConfig,
    #[serde(default)]
    pub feedback: FeedbackConfig,
    #[serde(default)]
    pub routing: Routing,
    #[serde(default = "default_device")]
    pub device: DeviceLayout,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            midi: MidiConfig::default(),
            feedback: FeedbackConfig::default(),
            routing: Routing::default(),
            device: default_device(),
        }
    }
}

/// MIDI output configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MidiConfig {
    /// Substring of the output port name (case-insensitive)
    #[serde(default = "default_output_port")]
    pub output_port: String,
    #[serde(default = "default_client_name")]
    pub client_name: String,
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            output_port: default_output_port(),
            client_name: default_client_name(),
        }
    }
}

/// LED feedback configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedbackConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_color: Option<ColorSpec>,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            grid_color: None,
        }
    }
}

/// Color written either as a number or as a hex string
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ColorSpec {
    Numeric(u32),
    Text(String),
}

impl ColorSpec {
    pub fn resolve(&self) -> Option<FeedbackColor> {
        match self {
            ColorSpec::Numeric(n) => Some(FeedbackColor(*n)),
            ColorSpec::Text(s) => parse_color(s),
        }
    }
}

impl AppConfig {
    /// Load configuration from file with validation
    pub async fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: AppConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML config: {}", path))?;

        config.validate()?;

        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to built-in defaults
    pub async fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path).await
        } else {
            warn!("Config file {} not found, using built-in defaults", path);
            Ok(Self::default())
        }
    }

    /// Validate configuration for correctness and consistency
    pub fn validate(&self) -> Result<()> {
        if self.midi.output_port.trim().is_empty() {
            anyhow::bail!("MIDI output_port cannot be empty");
        }
        if self.midi.client_name.trim().is_empty() {
            anyhow::bail!("MIDI client_name cannot be empty");
        }

        if self.feedback.interval_ms == 0 || self.feedback.interval_ms > 1000 {
            anyhow::bail!(
                "feedback interval_ms {} is invalid (must be 1-1000)",
                self.feedback.interval_ms
            );
        }
        if let Some(spec) = &self.feedback.grid_color {
            if spec.resolve().is_none() {
                anyhow::bail!("feedback grid_color {:?} is not a valid color", spec);
            }
        }

        let routing = [
            ("starting_note", self.routing.starting_note),
            ("button_cc_base", self.routing.button_cc_base),
            ("encoder_cc", self.routing.encoder_cc),
            ("slider_cc_base", self.routing.slider_cc_base),
        ];
        for (name, value) in routing {
            if value > 127 {
                anyhow::bail!("routing {} {} is invalid (must be 0-127)", name, value);
            }
        }

        if self.device.device.trim().is_empty() {
            anyhow::bail!("device name cannot be empty");
        }
        if let Some(grid) = self.device.grid {
            if grid.count as usize > GRID_CAPACITY {
                warn!(
                    "device grid has {} pads, only the first {} are used",
                    grid.count, GRID_CAPACITY
                );
            }
        }

        Ok(())
    }

    pub fn feedback_interval(&self) -> Duration {
        Duration::from_millis(self.feedback.interval_ms.max(1))
    }

    /// Bridge settings, with an optional grid color taking precedence over the file
    pub fn settings(&self, grid_color_override: Option<FeedbackColor>) -> BridgeSettings {
        let grid_color = grid_color_override
            .or_else(|| self.feedback.grid_color.as_ref().and_then(ColorSpec::resolve))
            .unwrap_or(FeedbackColor::DEFAULT_GRID);
        if grid_color_override.is_some() {
            info!("Grid color overridden: {}", grid_color);
        }
        BridgeSettings {
            routing: self.routing,
            grid_color,
        }
    }
}

/// Built-in layout: 16 pads after 8 buttons, one encoder, two sliders
pub fn default_device() -> DeviceLayout {
    DeviceLayout {
        vendor: "Generic".to_string(),
        device: "Pad Controller".to_string(),
        grid: Some(GridInfo::from_id_range(8, 24)),
        controls: ControlCounts {
            buttons: 8,
            encoders: 1,
            sliders: 2,
            grids: 16,
        },
        mode_buttons: ModeButtons {
            shift: Some(0),
            group: Some(1),
            fixed_velocity: Some(2),
        },
        capabilities: Capabilities::default(),
    }
}

// Default value functions
fn default_output_port() -> String { "padbridge".to_string() }
fn default_client_name() -> String { "padbridge".to_string() }
fn default_interval_ms() -> u64 { 33 }

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_validate() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.routing.starting_note, 24);
        assert_eq!(config.device.grid.map(|g| g.count), Some(16));
        assert_eq!(config.feedback_interval(), Duration::from_millis(33));
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.midi.output_port, "padbridge");
        assert_eq!(config.device, default_device());
    }

    #[tokio::test]
    async fn test_load_partial_file() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(
            file,
            r#"
midi:
  output_port: "loopMIDI"
feedback:
  interval_ms: 20
  grid_color: "0xFF00FF00"
routing:
  starting_note: 36
device:
  device: "Mikro"
  grid: {{ id_offset: 40, count: 16 }}
  controls: {{ buttons: 40, grids: 16 }}
  mode_buttons: {{ shift: 3, group: 4 }}
  capabilities: {{ has_fixed_velocity: false }}
"#
        )?;

        let config = AppConfig::load(&file.path().to_string_lossy()).await?;
        assert_eq!(config.midi.output_port, "loopMIDI");
        assert_eq!(config.midi.client_name, "padbridge");
        assert_eq!(config.routing.starting_note, 36);
        assert_eq!(config.routing.encoder_cc, 2);
        assert!(!config.device.capabilities.has_fixed_velocity);
        assert!(config.device.capabilities.has_channels);
        assert_eq!(config.device.mode_buttons.fixed_velocity, None);

        let settings = config.settings(None);
        assert_eq!(settings.grid_color, FeedbackColor(0xFF00_FF00));
        Ok(())
    }

    #[tokio::test]
    async fn test_load_rejects_bad_values() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(file, "routing:\n  starting_note: 200\n")?;
        assert!(AppConfig::load(&file.path().to_string_lossy()).await.is_err());

        let mut file = tempfile::NamedTempFile::new()?;
        write!(file, "feedback:\n  interval_ms: 0\n")?;
        assert!(AppConfig::load(&file.path().to_string_lossy()).await.is_err());

        let mut file = tempfile::NamedTempFile::new()?;
        write!(file, "feedback:\n  grid_color: \"teal\"\n")?;
        assert!(AppConfig::load(&file.path().to_string_lossy()).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_file_falls_back() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("absent.yaml");
        let config = AppConfig::load_or_default(&path.to_string_lossy()).await?;
        assert_eq!(config.midi.output_port, "padbridge");
        Ok(())
    }

    #[test]
    fn test_grid_color_override_wins() {
        let mut config = AppConfig::default();
        config.feedback.grid_color = Some(ColorSpec::Numeric(0x7F11_2233));

        assert_eq!(config.settings(None).grid_color, FeedbackColor(0x7F11_2233));
        assert_eq!(
            config.settings(Some(FeedbackColor::FULL)).grid_color,
            FeedbackColor::FULL
        );
        assert_eq!(
            AppConfig::default().settings(None).grid_color,
            FeedbackColor::DEFAULT_GRID
        );
    }
}
