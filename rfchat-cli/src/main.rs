//! rfchat: keyboard-to-keyboard chat over AX.25 UI frames via a KISS TNC.

mod app;
mod ax25;
mod cli;
mod config;
mod kiss;
mod link;
mod logging;
mod render;

use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use tracing::info;

use rfchat_core::ChatCore;

use crate::link::{KissLink, DEFAULT_CONNECT_ATTEMPTS, DEFAULT_CONNECT_BACKOFF};
use crate::render::Renderer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let config = config::load(&cli).context("configuration error")?;

    let _log_guard = logging::init(&config.log_file, config.log_level.raise(config.verbose))?;
    info!(
        callsign = %config.callsign,
        host = %config.host,
        port = config.port,
        time_delay = ?config.time_delay,
        "starting rfchat"
    );

    let (link, inbound) = KissLink::open(
        &config.host,
        config.port,
        DEFAULT_CONNECT_ATTEMPTS,
        DEFAULT_CONNECT_BACKOFF,
    )
    .await
    .context("cannot reach the KISS TNC; is direwolf running?")?;

    let core = ChatCore::new(config.callsign.clone(), config.time_delay, Instant::now());
    let renderer = Renderer::new(config.callsign.clone(), config.colors.clone());

    println!("Connected as {} via {}:{}.", config.callsign, config.host, config.port);
    println!("Type CALLSIGN message to chat, /clear to clear, /quit to exit.");

    app::run(core, link, inbound, renderer).await?;

    // Give the non-blocking log writer a beat to drain before the guard drops.
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(())
}
