//! Session event loop. One task owns the `ChatCore` and everything flows
//! through it: stdin lines, inbound frames from the link reader, a periodic
//! transmit tick, and ctrl-c. No locks; the channels are the only sharing.

use std::time::{Duration, Instant, SystemTime};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use rfchat_core::{ChatCore, ChatEvent, StatusLevel};

use crate::ax25;
use crate::link::{InboundFrame, KissLink, LinkError};
use crate::render::Renderer;

/// How often the loop re-checks the transmit gates.
const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Result of parsing one line of user input.
enum Input {
    Message { destination: String, text: String },
    Quit,
    Clear,
    Malformed(String),
}

fn parse_input(line: &str) -> Option<Input> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match line {
        "/quit" => return Some(Input::Quit),
        "/clear" => return Some(Input::Clear),
        _ => {}
    }
    if let Some(unknown) = line.strip_prefix('/') {
        return Some(Input::Malformed(format!(
            "unknown command /{unknown}; available: /quit, /clear"
        )));
    }
    match line.split_once(' ') {
        Some((destination, text)) if !text.trim().is_empty() => Some(Input::Message {
            destination: destination.to_uppercase(),
            text: text.trim().to_string(),
        }),
        _ => Some(Input::Malformed(
            "usage: CALLSIGN message text".to_string(),
        )),
    }
}

/// Run the session until /quit, ctrl-c, or the link drops.
pub async fn run(
    mut core: ChatCore,
    mut link: KissLink,
    mut inbound: mpsc::Receiver<InboundFrame>,
    renderer: Renderer,
) -> Result<(), LinkError> {
    let (line_tx, mut lines) = mpsc::channel::<String>(8);
    tokio::spawn(read_stdin(line_tx));

    let mut tick = tokio::time::interval(TICK_INTERVAL);
    info!(callsign = core.callsign(), "session started");

    loop {
        tokio::select! {
            line = lines.recv() => {
                match line {
                    Some(line) => handle_line(&mut core, &renderer, &line),
                    // stdin closed; treat like /quit.
                    None => core.request_exit(),
                }
            }
            frame = inbound.recv() => {
                match frame {
                    Some(frame) => handle_inbound(&mut core, &renderer, frame),
                    None => {
                        render_status(
                            &renderer,
                            StatusLevel::Error,
                            "lost connection to the TNC",
                        );
                        core.request_exit();
                    }
                }
            }
            _ = tick.tick() => {
                if core.exit_requested() {
                    break;
                }
                let now = Instant::now();
                if let Some(frame) = core.poll_transmit(now) {
                    link.transmit(&frame).await?;
                    core.transmit_complete(Instant::now());
                }
            }
            _ = tokio::signal::ctrl_c() => {
                core.request_exit();
                break;
            }
        }
    }
    info!("session ended");
    Ok(())
}

fn handle_line(core: &mut ChatCore, renderer: &Renderer, line: &str) {
    match parse_input(line) {
        None => {}
        Some(Input::Quit) => {
            core.request_exit();
            if core.pending_acks() > 0 {
                render_status(
                    renderer,
                    StatusLevel::Warning,
                    &format!("{} message(s) still unacknowledged", core.pending_acks()),
                );
            }
        }
        Some(Input::Clear) => renderer.clear_screen(),
        Some(Input::Malformed(reason)) => {
            render_status(renderer, StatusLevel::Warning, &reason);
        }
        Some(Input::Message { destination, text }) => {
            if let Err(err) = ax25::validate_callsign(&destination) {
                render_status(renderer, StatusLevel::Warning, &err.to_string());
                return;
            }
            for event in core.send_message(&destination, &text, SystemTime::now()) {
                renderer.render(&event);
            }
        }
    }
}

fn handle_inbound(core: &mut ChatCore, renderer: &Renderer, frame: InboundFrame) {
    if frame.destination != core.callsign() {
        debug!(
            destination = %frame.destination,
            source = %frame.source,
            "overheard frame for someone else"
        );
        return;
    }
    let events = core.on_frame_received(
        &frame.source,
        &frame.envelope,
        Instant::now(),
        SystemTime::now(),
    );
    for event in &events {
        if let ChatEvent::Status { level, text } = event {
            match level {
                StatusLevel::Warning => warn!(source = %frame.source, "{text}"),
                StatusLevel::Error => error!(source = %frame.source, "{text}"),
                StatusLevel::Info => info!(source = %frame.source, "{text}"),
            }
        }
        renderer.render(event);
    }
}

fn render_status(renderer: &Renderer, level: StatusLevel, text: &str) {
    renderer.render(&ChatEvent::Status {
        level,
        text: text.to_string(),
    });
}

async fn read_stdin(tx: mpsc::Sender<String>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if tx.send(line).await.is_err() {
            return;
        }
    }
}
