//! Host-driven session state machine: one task owns a `ChatCore` and funnels
//! input lines, inbound frames, transmit completions and clock ticks into it.
//! The core returns frames to transmit and structured display events; it
//! never formats color or layout and never touches I/O itself.

use std::time::{Duration, Instant, SystemTime};

use crate::pending::{AckTracker, PendingAck};
use crate::protocol::{CompressionKind, MessageId, MessageKind};
use crate::scheduler::TxScheduler;
use crate::wire::{self, Frame};

/// Severity for status events, mapped to color and log level by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// Structured display events for the host's renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// A message of ours went onto the outbound queue.
    Sent {
        at: SystemTime,
        source: String,
        destination: String,
        text: String,
    },
    /// A message arrived addressed to us.
    Received {
        at: SystemTime,
        source: String,
        destination: String,
        text: String,
    },
    /// A pending send was acknowledged. `at` is the original send time so
    /// the host can re-render the line it printed back then.
    Acknowledged {
        at: SystemTime,
        id: MessageId,
        source: String,
        destination: String,
        text: String,
    },
    /// Out-of-band condition worth telling the user about.
    Status { level: StatusLevel, text: String },
}

/// Session state: id counter, pending-ack table, outbound queue and exit
/// flag. All mutable protocol state lives here, behind one owner.
pub struct ChatCore {
    callsign: String,
    counter: MessageId,
    tracker: AckTracker,
    scheduler: TxScheduler,
    exit: bool,
}

impl ChatCore {
    pub fn new(callsign: String, time_delay: Duration, now: Instant) -> Self {
        Self {
            callsign,
            counter: MessageId::ZERO,
            tracker: AckTracker::new(),
            scheduler: TxScheduler::new(time_delay, now),
            exit: false,
        }
    }

    pub fn callsign(&self) -> &str {
        &self.callsign
    }

    /// Queue a user message for transmission and start tracking its ack.
    /// `at` is the wall-clock send time shown to the user; transmission
    /// timing is decided later by the poll gates.
    pub fn send_message(
        &mut self,
        destination: &str,
        text: &str,
        at: SystemTime,
    ) -> Vec<ChatEvent> {
        let id = self.counter;
        self.counter = self.counter.wrapping_next();

        let frame = Frame::message(
            destination,
            &self.callsign,
            id,
            text,
            CompressionKind::Dictionary,
        );
        self.scheduler.enqueue(frame);
        self.tracker.record_sent(
            id,
            PendingAck {
                sent_at: at,
                source: self.callsign.clone(),
                destination: destination.to_string(),
                text: text.to_string(),
            },
        );

        vec![ChatEvent::Sent {
            at,
            source: self.callsign.clone(),
            destination: destination.to_string(),
            text: text.to_string(),
        }]
    }

    /// Dispatch an inbound envelope from the link adapter. Undecodable
    /// frames are dropped with a status event; MSG frames are rendered and
    /// answered with an ack through the normal queue; ACK frames resolve the
    /// tracker, with a miss reported rather than treated as fatal.
    pub fn on_frame_received(
        &mut self,
        source: &str,
        envelope: &[u8],
        now: Instant,
        at: SystemTime,
    ) -> Vec<ChatEvent> {
        self.scheduler.note_activity(now);

        let decoded = match wire::decode_envelope(envelope) {
            Ok(decoded) => decoded,
            Err(err) => {
                return vec![ChatEvent::Status {
                    level: StatusLevel::Warning,
                    text: format!("dropping undecodable frame from {source}: {err}"),
                }];
            }
        };

        match decoded.kind {
            MessageKind::Msg => {
                self.scheduler
                    .enqueue(Frame::ack(source, &self.callsign, decoded.id));
                vec![ChatEvent::Received {
                    at,
                    source: source.to_string(),
                    destination: self.callsign.clone(),
                    text: decoded.text,
                }]
            }
            MessageKind::Ack => match self.tracker.resolve(decoded.id) {
                Some(entry) => vec![ChatEvent::Acknowledged {
                    at: entry.sent_at,
                    id: decoded.id,
                    source: entry.source,
                    destination: entry.destination,
                    text: entry.text,
                }],
                None => vec![ChatEvent::Status {
                    level: StatusLevel::Warning,
                    text: format!(
                        "ack from {source} for unknown or already-acknowledged message id {}",
                        decoded.id
                    ),
                }],
            },
        }
    }

    /// Next frame to hand to the link adapter, if the gates allow one.
    pub fn poll_transmit(&mut self, now: Instant) -> Option<Frame> {
        if self.exit {
            return None;
        }
        self.scheduler.poll(now)
    }

    /// The link adapter finished transmitting the frame from the last poll.
    pub fn transmit_complete(&mut self, now: Instant) {
        self.scheduler.transmit_complete(now);
    }

    /// Stop dequeuing; in-flight transmissions are not interrupted.
    pub fn request_exit(&mut self) {
        self.exit = true;
    }

    pub fn exit_requested(&self) -> bool {
        self.exit
    }

    pub fn pending_acks(&self) -> usize {
        self.tracker.pending_count()
    }

    pub fn queued_frames(&self) -> usize {
        self.scheduler.queued()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::decode_envelope;
    use std::time::Duration;

    const DELAY: Duration = Duration::from_secs(2);

    fn core(callsign: &str, now: Instant) -> ChatCore {
        ChatCore::new(callsign.to_string(), DELAY, now)
    }

    fn drain(core: &mut ChatCore, mut now: Instant) -> (Vec<Frame>, Instant) {
        let mut frames = Vec::new();
        loop {
            now += DELAY;
            match core.poll_transmit(now) {
                Some(frame) => {
                    core.transmit_complete(now);
                    frames.push(frame);
                }
                None => return (frames, now),
            }
        }
    }

    #[test]
    fn end_to_end_send_receive_ack() {
        let t0 = Instant::now();
        let wall = SystemTime::now();
        let mut alice = core("ALICE", t0);
        let mut bob = core("BOB", t0);

        // ALICE types "BOB hello there".
        let events = alice.send_message("BOB", "hello there", wall);
        assert!(matches!(
            events.as_slice(),
            [ChatEvent::Sent { destination, text, .. }]
                if destination == "BOB" && text == "hello there"
        ));
        assert_eq!(alice.pending_acks(), 1);

        // The frame drains through the gates and crosses the channel.
        let (frames, _) = drain(&mut alice, t0);
        assert_eq!(frames.len(), 1);
        let frame = &frames[0];
        assert_eq!(frame.destination, "BOB");
        assert_eq!(frame.source, "ALICE");
        let envelope = decode_envelope(&frame.envelope).unwrap();
        assert_eq!(envelope.text, "hello there");

        // BOB receives it, renders it and queues an ack.
        let events = bob.on_frame_received(&frame.source, &frame.envelope, t0, wall);
        assert!(matches!(
            events.as_slice(),
            [ChatEvent::Received { source, text, .. }]
                if source == "ALICE" && text == "hello there"
        ));
        let (acks, _) = drain(&mut bob, t0);
        assert_eq!(acks.len(), 1);
        assert_eq!(acks[0].destination, "ALICE");

        // The ack resolves ALICE's pending entry exactly once.
        let events = alice.on_frame_received(&acks[0].source, &acks[0].envelope, t0, wall);
        assert!(matches!(
            events.as_slice(),
            [ChatEvent::Acknowledged { destination, text, .. }]
                if destination == "BOB" && text == "hello there"
        ));
        assert_eq!(alice.pending_acks(), 0);

        // A replayed ack reports unknown instead of resolving twice.
        let events = alice.on_frame_received(&acks[0].source, &acks[0].envelope, t0, wall);
        assert!(matches!(
            events.as_slice(),
            [ChatEvent::Status { level: StatusLevel::Warning, .. }]
        ));
    }

    #[test]
    fn ack_for_never_sent_id_reports_unknown() {
        let t0 = Instant::now();
        let mut alice = core("ALICE", t0);
        let stray = Frame::ack("ALICE", "BOB", MessageId::new(77).unwrap());
        let events = alice.on_frame_received("BOB", &stray.envelope, t0, SystemTime::now());
        assert!(matches!(
            events.as_slice(),
            [ChatEvent::Status { level: StatusLevel::Warning, text }]
                if text.contains("77")
        ));
        assert_eq!(alice.pending_acks(), 0);
    }

    #[test]
    fn undecodable_frame_dropped_session_continues() {
        let t0 = Instant::now();
        let wall = SystemTime::now();
        let mut alice = core("ALICE", t0);

        let events = alice.on_frame_received("BOB", &[0b10 << 6, 0, 0], t0, wall);
        assert!(matches!(
            events.as_slice(),
            [ChatEvent::Status { level: StatusLevel::Warning, .. }]
        ));

        // Session still works afterwards.
        let events = alice.send_message("BOB", "still here", wall);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn acks_queue_behind_pending_sends() {
        let t0 = Instant::now();
        let wall = SystemTime::now();
        let mut alice = core("ALICE", t0);

        alice.send_message("BOB", "first", wall);
        alice.send_message("BOB", "second", wall);
        let incoming = Frame::message(
            "ALICE",
            "CAROL",
            MessageId::new(5).unwrap(),
            "hi alice",
            CompressionKind::Dictionary,
        );
        alice.on_frame_received("CAROL", &incoming.envelope, t0, wall);

        let (frames, _) = drain(&mut alice, t0);
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].destination, "BOB");
        assert_eq!(frames[1].destination, "BOB");
        // The ack comes last: no priority lane.
        assert_eq!(frames[2].destination, "CAROL");
        let last = decode_envelope(&frames[2].envelope).unwrap();
        assert_eq!(last.kind, MessageKind::Ack);
        assert_eq!(last.id.value(), 5);
    }

    #[test]
    fn counter_increments_per_send() {
        let t0 = Instant::now();
        let wall = SystemTime::now();
        let mut alice = core("ALICE", t0);
        alice.send_message("BOB", "one", wall);
        alice.send_message("BOB", "two", wall);
        let (frames, _) = drain(&mut alice, t0);
        let ids: Vec<u16> = frames
            .iter()
            .map(|f| decode_envelope(&f.envelope).unwrap().id.value())
            .collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn exit_halts_future_dequeues() {
        let t0 = Instant::now();
        let mut alice = core("ALICE", t0);
        alice.send_message("BOB", "bye", SystemTime::now());
        alice.request_exit();
        assert!(alice.exit_requested());
        assert!(alice.poll_transmit(t0 + DELAY).is_none());
    }

    #[test]
    fn received_frame_defers_queued_transmit() {
        let t0 = Instant::now();
        let wall = SystemTime::now();
        let mut alice = core("ALICE", t0);
        alice.send_message("BOB", "hello", wall);

        // A frame heard one second in pushes the window out.
        let heard = t0 + Duration::from_secs(1);
        let incoming = Frame::message(
            "ALICE",
            "CAROL",
            MessageId::new(1).unwrap(),
            "hi",
            CompressionKind::None,
        );
        alice.on_frame_received("CAROL", &incoming.envelope, heard, wall);

        assert!(alice.poll_transmit(t0 + DELAY).is_none());
        assert!(alice.poll_transmit(heard + DELAY).is_some());
    }
}
