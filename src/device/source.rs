//! Event sources feeding batches into a device actor

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::fs;
use tokio::sync::mpsc;

use super::Event;

/// Producer of ordered event batches
///
/// `None` means the source is exhausted and the device should be removed.
#[async_trait]
pub trait EventSource: Send {
    async fn next_batch(&mut self) -> Option<Vec<Event>>;
}

/// Batches pushed from another thread (e.g. the REPL)
pub struct ChannelSource {
    rx: mpsc::Receiver<Vec<Event>>,
}

impl ChannelSource {
    pub fn new(capacity: usize) -> (mpsc::Sender<Vec<Event>>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self { rx })
    }
}

#[async_trait]
impl EventSource for ChannelSource {
    async fn next_batch(&mut self) -> Option<Vec<Event>> {
        self.rx.recv().await
    }
}

/// On-disk form of a recorded event script
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventScript {
    /// Pause before each batch
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    pub batches: Vec<Vec<Event>>,
}

fn default_delay_ms() -> u64 {
    100
}

/// Replays batches from a YAML script
pub struct ScriptSource {
    delay: Duration,
    batches: VecDeque<Vec<Event>>,
}

impl ScriptSource {
    pub fn new(script: EventScript) -> Self {
        Self {
            delay: Duration::from_millis(script.delay_ms),
            batches: script.batches.into(),
        }
    }

    /// Load a script file
    pub async fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read event script: {}", path))?;
        let script: EventScript = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse event script: {}", path))?;
        Ok(Self::new(script))
    }

    pub fn remaining(&self) -> usize {
        self.batches.len()
    }
}

#[async_trait]
impl EventSource for ScriptSource {
    async fn next_batch(&mut self) -> Option<Vec<Event>> {
        let batch = self.batches.pop_front()?;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Some(batch)
    }
}
