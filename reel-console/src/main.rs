//! Deck monitor console — entry point.
//!
//! ```text
//! reel-console                    Connect with defaults
//! reel-console --config <path>    Use custom config TOML
//! reel-console --server <addr>    Override the backend host:port
//! reel-console --gen-config       Dump default config and exit
//! ```

mod config;

use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use reel_core::network::{ConnectionInfo, Supervisor};
use reel_core::protocol::Command;
use reel_core::router::{EventRouter, UiEvent};

use crate::config::ConsoleConfig;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "reel-console", about = "Deck transport and clip monitor")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "reel-console.toml")]
    config: PathBuf,

    /// Backend address (overrides config). Example: 192.168.1.20:8765
    #[arg(short, long)]
    server: Option<String>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        let text = toml::to_string_pretty(&ConsoleConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    let mut config = ConsoleConfig::load(&cli.config);
    if let Some(addr) = cli.server {
        let (host, port) = addr
            .rsplit_once(':')
            .ok_or("--server expects host:port")?;
        config.network.host = host.to_string();
        config.network.port = port.parse()?;
    }

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("reel-console v{}", env!("CARGO_PKG_VERSION"));

    // ── 1. Start the supervised link ────────────────────────────

    let info = ConnectionInfo::new(config.network.host.clone(), config.network.port);
    info!("connecting to {info}");

    let (supervisor, handle, mut link_rx) =
        Supervisor::new(info, Command::Monitor, config.network.backoff());
    tokio::spawn(supervisor.run());

    // ── 2. Wire the router ──────────────────────────────────────

    let (mut router, mut ui_rx) = EventRouter::new(handle);

    // ── 3. Event loop ───────────────────────────────────────────

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            link = link_rx.recv() => match link {
                Some(link) => router.handle_link(link),
                None => break,
            },
            ui = ui_rx.recv() => match ui {
                Some(event) => render(event),
                None => break,
            },
            _ = &mut ctrl_c => {
                info!("interrupted; shutting down");
                break;
            }
        }
    }

    Ok(())
}

// ── Rendering ────────────────────────────────────────────────────

fn render(event: UiEvent) {
    match event {
        UiEvent::LinkUp => info!("link up"),
        UiEvent::LinkDown { reason } => warn!("link down: {reason}"),
        UiEvent::StateLine(line) => println!("transport  {line}"),
        UiEvent::Position { current, duration } => {
            println!("position   {current} / {duration}");
        }
        UiEvent::ClipListReset { count, selected } => {
            println!("clips      {count} entries (selected: {selected:?})");
        }
        UiEvent::ClipUpdated { index, label } => println!("clip {index:>3}   {label}"),
        UiEvent::ClipSelected { index } => println!("selected   clip {index}"),
        UiEvent::Network { host, port } => println!("deck at    {host}:{port}"),
        UiEvent::Transcript { sent, received } => {
            println!(">> {sent}");
            println!("<< {received}");
        }
        UiEvent::DiskFull => warn!("deck reports disk full"),
        UiEvent::Error { message } => warn!("deck error: {message}"),
    }
}
