//! padbridge - pad controller to MIDI bridge
//!
//! Runs one bridge for the configured device layout, fed either by the
//! interactive virtual controller or by a recorded event script.

use anyhow::{anyhow, Result};
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use padbridge::cli;
use padbridge::color::parse_color;
use padbridge::config::AppConfig;
use padbridge::device::{ChannelSource, ProtocolSink, ScriptSource};
use padbridge::error::AcceptError;
use padbridge::output::{list_output_ports, ConsoleSurface, MidiOutputSink, NullSink};
use padbridge::runtime::{self, DeviceActor, StopReason};

/// padbridge - modal pad controller to MIDI bridge
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// List available MIDI output ports
    #[arg(long)]
    list_ports: bool,

    /// Replay a YAML event script instead of starting the REPL
    #[arg(short, long)]
    script: Option<String>,

    /// Output port substring, overriding the config file
    #[arg(short, long)]
    port: Option<String>,

    /// Log MIDI output instead of opening a port
    #[arg(long)]
    dry_run: bool,

    /// Grid color (decimal, 0x or # hex), overriding the config file
    #[arg(long, env = "PADBRIDGE_GRID_COLOUR")]
    grid_color: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    init_logging(&args.log_level)?;

    info!("Starting padbridge...");

    if args.list_ports {
        list_ports_formatted("padbridge-list");
        return Ok(());
    }

    info!("Configuration file: {}", args.config);
    let mut config = AppConfig::load_or_default(&args.config).await?;

    if let Some(port) = &args.port {
        config.midi.output_port = port.clone();
    }

    let grid_override = match &args.grid_color {
        Some(text) => {
            Some(parse_color(text).ok_or_else(|| anyhow!("Invalid grid color '{}'", text))?)
        }
        None => None,
    };
    let settings = config.settings(grid_override);

    let label = config.device.label();
    let sink: Box<dyn ProtocolSink> = if args.dry_run {
        info!("Dry run: MIDI output is logged only");
        Box::new(NullSink::new())
    } else {
        let sink = MidiOutputSink::open(&config.midi.output_port, &config.midi.client_name)
            .map_err(|e| AcceptError::Output {
                device: label.clone(),
                reason: e.to_string(),
            })?;
        info!("{} sends to '{}'", label, sink.port_name());
        Box::new(sink)
    };

    let handle = DeviceActor::accept(
        &config.device,
        &settings,
        sink,
        Box::new(ConsoleSurface::new()),
        config.feedback_interval(),
    )?;

    let reason = match &args.script {
        Some(path) => {
            let mut source = ScriptSource::load(path).await?;
            info!("Replaying {} batches from {}", source.remaining(), path);
            runtime::run(&mut source, &handle, shutdown_signal()).await
        }
        None => {
            let (tx, mut source) = ChannelSource::new(32);
            let repl_handle = handle.clone();
            let buttons = config.device.mode_buttons;
            let repl = tokio::task::spawn_blocking(move || cli::run_repl(tx, repl_handle, buttons));

            let reason = runtime::run(&mut source, &handle, shutdown_signal()).await;
            if reason != StopReason::Shutdown {
                match repl.await {
                    Ok(Err(e)) => warn!("REPL failed: {}", e),
                    Err(e) => warn!("REPL task failed: {}", e),
                    Ok(Ok(())) => {}
                }
            }
            reason
        }
    };

    if let Some(status) = handle.status().await {
        info!(
            "Final state: {} group {}/{} channel {} value {}",
            status.overlay,
            status.group_id,
            status.max_groups,
            status.channel + 1,
            status.channel_value
        );
        if let Ok(json) = serde_json::to_string(&status) {
            debug!("Final status: {}", json);
        }
    }

    handle.remove(reason == StopReason::ActorStopped);
    handle.closed().await;

    info!("padbridge shutdown complete");
    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to install CTRL+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

fn list_ports_formatted(client_name: &str) {
    use colored::*;

    println!("\n{}", "=== Available MIDI Output Ports ===".bold().cyan());

    match list_output_ports(client_name) {
        Ok(ports) if ports.is_empty() => {
            println!("  {}", "No output ports found".dimmed());
        }
        Ok(ports) => {
            for (idx, name) in ports.iter().enumerate() {
                println!("  {} {}", format!("[{}]", idx).green(), name);
            }
        }
        Err(e) => println!("  {} {}", "error:".red().bold(), e),
    }
    println!();
}
