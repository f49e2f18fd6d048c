//! KISS framing for the TNC TCP socket: FEND-delimited frames with FESC byte
//! stuffing, data frames on port 0.

/// Frame delimiter.
pub const FEND: u8 = 0xC0;
/// Escape byte.
pub const FESC: u8 = 0xDB;
/// Escaped FEND.
pub const TFEND: u8 = 0xDC;
/// Escaped FESC.
pub const TFESC: u8 = 0xDD;

/// Command byte for a data frame on TNC port 0.
const CMD_DATA_PORT0: u8 = 0x00;

/// Wrap payload bytes in a KISS data frame.
pub fn encode(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 3);
    out.push(FEND);
    out.push(CMD_DATA_PORT0);
    for &byte in payload {
        match byte {
            FEND => out.extend_from_slice(&[FESC, TFEND]),
            FESC => out.extend_from_slice(&[FESC, TFESC]),
            other => out.push(other),
        }
    }
    out.push(FEND);
    out
}

/// Incremental deframer fed from the socket read loop. Handles partial
/// reads, back-to-back frames and escapes split across read boundaries.
#[derive(Debug, Default)]
pub struct KissDeframer {
    buf: Vec<u8>,
    escaped: bool,
}

impl KissDeframer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw socket bytes; returns the payloads of any completed port-0
    /// data frames (command byte stripped). Other frame types are discarded.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();
        for &byte in bytes {
            if self.escaped {
                self.escaped = false;
                match byte {
                    TFEND => self.buf.push(FEND),
                    TFESC => self.buf.push(FESC),
                    // Not a legal escape; keep the raw byte rather than
                    // discarding the whole frame.
                    other => self.buf.push(other),
                }
                continue;
            }
            match byte {
                FESC => self.escaped = true,
                FEND => {
                    if let Some(frame) = self.take_frame() {
                        frames.push(frame);
                    }
                }
                other => self.buf.push(other),
            }
        }
        frames
    }

    fn take_frame(&mut self) -> Option<Vec<u8>> {
        self.escaped = false;
        let frame = std::mem::take(&mut self.buf);
        match frame.split_first() {
            // Empty frames are idle FENDs between frames.
            None => None,
            // Full-byte match: the high nibble is the TNC port, and only
            // port 0 is ours.
            Some((&cmd, payload)) if cmd == CMD_DATA_PORT0 => Some(payload.to_vec()),
            // Hardware replies (TXDELAY etc.) and other ports' traffic are
            // not ours to parse.
            Some(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_roundtrip() {
        let payload = b"hello tnc";
        let wire = encode(payload);
        let mut deframer = KissDeframer::new();
        let frames = deframer.push(&wire);
        assert_eq!(frames, vec![payload.to_vec()]);
    }

    #[test]
    fn special_bytes_are_escaped() {
        let payload = [0x01, FEND, FESC, 0x02];
        let wire = encode(&payload);
        // No naked FEND/FESC between the delimiters.
        assert!(!wire[1..wire.len() - 1].contains(&FEND));
        let mut deframer = KissDeframer::new();
        assert_eq!(deframer.push(&wire), vec![payload.to_vec()]);
    }

    #[test]
    fn split_reads_reassemble() {
        let payload = [FEND, 0x42, FESC];
        let wire = encode(&payload);
        let mut deframer = KissDeframer::new();
        let mut frames = Vec::new();
        for chunk in wire.chunks(1) {
            frames.extend(deframer.push(chunk));
        }
        assert_eq!(frames, vec![payload.to_vec()]);
    }

    #[test]
    fn back_to_back_frames() {
        let mut wire = encode(b"one");
        wire.extend_from_slice(&encode(b"two"));
        let mut deframer = KissDeframer::new();
        let frames = deframer.push(&wire);
        assert_eq!(frames, vec![b"one".to_vec(), b"two".to_vec()]);
    }

    #[test]
    fn other_port_data_frames_skipped() {
        let mut deframer = KissDeframer::new();
        // Same data command, TNC port 1 in the high nibble.
        let frames = deframer.push(&[FEND, 0x10, b'n', b'o', FEND]);
        assert!(frames.is_empty());
        assert_eq!(deframer.push(&encode(b"ours")), vec![b"ours".to_vec()]);
    }

    #[test]
    fn idle_fends_and_foreign_commands_skipped() {
        let mut deframer = KissDeframer::new();
        // Stream of idle delimiters, then a TXDELAY config frame, then data.
        let mut wire = vec![FEND, FEND, FEND, 0x01, 0x32, FEND];
        wire.extend_from_slice(&encode(b"real"));
        let frames = deframer.push(&wire);
        assert_eq!(frames, vec![b"real".to_vec()]);
    }
}
