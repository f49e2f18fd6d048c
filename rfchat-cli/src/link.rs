//! TNC link adapter: TCP connection to a KISS modem (direwolf or similar),
//! bounded-retry open, a reader task feeding inbound UI frames into a
//! channel, and a transmit path that completes when the frame is flushed.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use rfchat_core::Frame;

use crate::ax25::{self, Ax25Error};
use crate::kiss::{self, KissDeframer};

/// Connection attempts before giving up on the TNC.
pub const DEFAULT_CONNECT_ATTEMPTS: u32 = 4;
/// Pause between connection attempts.
pub const DEFAULT_CONNECT_BACKOFF: Duration = Duration::from_secs(1);

/// One inbound UI frame, link addressing already stripped off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundFrame {
    pub destination: String,
    pub source: String,
    pub envelope: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("cannot connect to TNC at {host}:{port} after {attempts} attempts: {last}")]
    ConnectExhausted {
        host: String,
        port: u16,
        attempts: u32,
        last: std::io::Error,
    },
    #[error("link I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Address(#[from] Ax25Error),
}

/// Write half of the TNC connection. The read half lives in a spawned task
/// that owns the deframer and pushes inbound frames into the channel
/// returned by [`KissLink::open`].
pub struct KissLink {
    writer: OwnedWriteHalf,
}

impl KissLink {
    /// Connect with bounded retry. Exhausting the attempt budget is fatal
    /// to the session; there is nothing to do without a link.
    pub async fn open(
        host: &str,
        port: u16,
        attempts: u32,
        backoff: Duration,
    ) -> Result<(KissLink, mpsc::Receiver<InboundFrame>), LinkError> {
        let mut last_err = None;
        for attempt in 1..=attempts.max(1) {
            match TcpStream::connect((host, port)).await {
                Ok(stream) => {
                    debug!(host, port, attempt, "connected to TNC");
                    let (reader, writer) = stream.into_split();
                    let (tx, rx) = mpsc::channel(32);
                    tokio::spawn(read_loop(reader, tx));
                    return Ok((KissLink { writer }, rx));
                }
                Err(err) => {
                    eprintln!("Waiting for TNC connection... attempt {attempt}/{attempts}");
                    debug!(host, port, attempt, %err, "TNC connect attempt failed");
                    last_err = Some(err);
                    tokio::time::sleep(backoff).await;
                }
            }
        }
        Err(LinkError::ConnectExhausted {
            host: host.to_string(),
            port,
            attempts,
            last: last_err
                .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "no attempt")),
        })
    }

    /// Transmit one frame. Returning means the bytes were handed to the
    /// kernel and flushed; the caller then reports transmit-complete to the
    /// core.
    pub async fn transmit(&mut self, frame: &Frame) -> Result<(), LinkError> {
        let ui = ax25::build_ui_frame(&frame.destination, &frame.source, &frame.envelope)?;
        let wire = kiss::encode(&ui);
        self.writer.write_all(&wire).await?;
        self.writer.flush().await?;
        debug!(
            destination = %frame.destination,
            bytes = wire.len(),
            "transmitted frame"
        );
        Ok(())
    }
}

async fn read_loop(mut reader: OwnedReadHalf, tx: mpsc::Sender<InboundFrame>) {
    let mut deframer = KissDeframer::new();
    let mut buf = [0u8; 1024];
    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => {
                warn!("TNC closed the connection");
                return;
            }
            Ok(n) => n,
            Err(err) => {
                warn!(%err, "TNC read failed");
                return;
            }
        };
        for payload in deframer.push(&buf[..n]) {
            match ax25::parse_ui_frame(&payload) {
                Ok((destination, source, envelope)) => {
                    let frame = InboundFrame {
                        destination,
                        source,
                        envelope,
                    };
                    if tx.send(frame).await.is_err() {
                        // Session is shutting down.
                        return;
                    }
                }
                Err(err) => {
                    debug!(%err, bytes = payload.len(), "ignoring non-UI frame");
                }
            }
        }
    }
}
