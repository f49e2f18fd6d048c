//! Transmission scheduler: FIFO outbound queue drained under half-duplex
//! gating. All timing is a pure function of the `Instant`s the host passes
//! in, so the gates are testable without sleeping.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::wire::Frame;

/// Default minimum spacing between channel activity and the next transmit.
pub const DEFAULT_TIME_DELAY: Duration = Duration::from_secs(2);

/// FIFO outbound queue plus the three transmit gates: queue non-empty, the
/// link not busy with an outstanding transmit, and at least `time_delay`
/// elapsed since the last channel activity in either direction.
#[derive(Debug)]
pub struct TxScheduler {
    queue: VecDeque<Frame>,
    busy: bool,
    last_activity: Instant,
    time_delay: Duration,
}

impl TxScheduler {
    pub fn new(time_delay: Duration, now: Instant) -> Self {
        Self {
            queue: VecDeque::new(),
            busy: false,
            last_activity: now,
            time_delay,
        }
    }

    /// Append a frame. Insertion order is transmission order; acks queue
    /// behind already-pending user sends like any other frame.
    pub fn enqueue(&mut self, frame: Frame) {
        self.queue.push_back(frame);
    }

    /// Dequeue the next frame if every gate passes, marking the link busy.
    /// The caller hands the frame to the link adapter and reports back via
    /// [`TxScheduler::transmit_complete`].
    pub fn poll(&mut self, now: Instant) -> Option<Frame> {
        if self.queue.is_empty() || self.busy {
            return None;
        }
        if now.duration_since(self.last_activity) < self.time_delay {
            return None;
        }
        self.busy = true;
        self.queue.pop_front()
    }

    /// The link finished the outstanding transmit: clear busy and stamp the
    /// channel activity clock.
    pub fn transmit_complete(&mut self, now: Instant) {
        self.busy = false;
        self.last_activity = now;
    }

    /// A frame arrived. Receiving occupies the shared channel too, so it
    /// pushes the next transmit window out.
    pub fn note_activity(&mut self, now: Instant) {
        self.last_activity = now;
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{CompressionKind, MessageId};

    fn frame(n: u32) -> Frame {
        Frame::message(
            "BOB",
            "ALICE",
            MessageId::new(n).unwrap(),
            "hi",
            CompressionKind::None,
        )
    }

    #[test]
    fn empty_queue_never_transmits() {
        let t0 = Instant::now();
        let mut sched = TxScheduler::new(DEFAULT_TIME_DELAY, t0);
        assert!(sched.poll(t0 + Duration::from_secs(60)).is_none());
    }

    #[test]
    fn delay_gate_holds_until_elapsed() {
        let t0 = Instant::now();
        let delay = Duration::from_secs(2);
        let mut sched = TxScheduler::new(delay, t0);
        sched.enqueue(frame(0));

        assert!(sched.poll(t0).is_none());
        assert!(sched.poll(t0 + Duration::from_millis(1_999)).is_none());
        assert!(sched.poll(t0 + delay).is_some());
    }

    #[test]
    fn busy_gate_holds_until_completion() {
        let t0 = Instant::now();
        let delay = Duration::from_secs(2);
        let mut sched = TxScheduler::new(delay, t0);
        sched.enqueue(frame(0));
        sched.enqueue(frame(1));

        let t1 = t0 + delay;
        assert!(sched.poll(t1).is_some());
        assert!(sched.is_busy());
        // Still busy: nothing comes out regardless of elapsed time.
        assert!(sched.poll(t1 + Duration::from_secs(60)).is_none());

        sched.transmit_complete(t1 + Duration::from_secs(60));
        assert!(!sched.is_busy());
    }

    #[test]
    fn back_to_back_frames_observe_minimum_gap() {
        let t0 = Instant::now();
        let delay = Duration::from_secs(2);
        let mut sched = TxScheduler::new(delay, t0);
        sched.enqueue(frame(0));
        sched.enqueue(frame(1));

        let first_tx = t0 + delay;
        let first = sched.poll(first_tx).unwrap();
        assert_eq!(decode_id(&first), 0);
        sched.transmit_complete(first_tx);

        // The second frame is gated until a full delay after the first.
        assert!(sched.poll(first_tx + delay - Duration::from_millis(1)).is_none());
        let second = sched.poll(first_tx + delay).unwrap();
        assert_eq!(decode_id(&second), 1);
    }

    #[test]
    fn incoming_activity_defers_transmission() {
        let t0 = Instant::now();
        let delay = Duration::from_secs(2);
        let mut sched = TxScheduler::new(delay, t0);
        sched.enqueue(frame(0));

        let heard = t0 + Duration::from_secs(1);
        sched.note_activity(heard);
        assert!(sched.poll(t0 + delay).is_none());
        assert!(sched.poll(heard + delay).is_some());
    }

    #[test]
    fn fifo_order_preserved() {
        let t0 = Instant::now();
        let mut sched = TxScheduler::new(Duration::ZERO, t0);
        for n in 0..3 {
            sched.enqueue(frame(n));
        }
        for n in 0..3 {
            let f = sched.poll(t0).unwrap();
            assert_eq!(decode_id(&f), n as u16);
            sched.transmit_complete(t0);
        }
    }

    fn decode_id(frame: &Frame) -> u16 {
        crate::wire::decode_envelope(&frame.envelope)
            .unwrap()
            .id
            .value()
    }
}
