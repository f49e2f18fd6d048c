//! rfchat protocol reference implementation.
//! Host-driven: no I/O; the host feeds input lines, inbound frames and clock
//! readings into [`ChatCore`] and receives frames to transmit plus structured
//! display events back.

pub mod compress;
pub mod core;
pub mod pending;
pub mod protocol;
pub mod scheduler;
pub mod wire;

pub use crate::core::{ChatCore, ChatEvent, StatusLevel};
pub use pending::{AckTracker, PendingAck};
pub use protocol::{CompressionKind, MessageId, MessageKind, ProtocolError};
pub use scheduler::TxScheduler;
pub use wire::{decode_envelope, encode_envelope, Envelope, Frame};
