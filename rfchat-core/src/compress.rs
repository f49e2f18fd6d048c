//! Payload codec: raw UTF-8 or dictionary substitution tuned for short
//! English chat text. The dictionary scheme is byte-exact for any input:
//! fragments found in the table become one-byte codes, everything else is
//! carried through literal escapes.

use crate::protocol::{CompressionKind, ProtocolError};

/// Escape code: the next byte is a single literal.
const LITERAL_ONE: u8 = 254;
/// Escape code: a length byte follows, then that many literal bytes.
const LITERAL_RUN: u8 = 255;

/// Fragments common in conversational English. Order does not matter for
/// correctness; the encoder always takes the longest match. Must stay below
/// 254 entries so codes never collide with the literal escapes.
const DICTIONARY: &[&str] = &[
    " ", "e", "t", "a", "o", "i", "n", "s", "r", "h", "l", "d", "u", "c", "m",
    "f", "p", "g", "w", "y", "b", "v", "k", "x", "j", "q", "z", ".", ",", "!",
    "?", "'", "0", "1", "2", "3", "4", "5", "6", "7", "8", "9",
    "th", "he", "in", "er", "an", "re", "on", "at", "en", "nd", "ti", "es",
    "or", "te", "of", "ed", "is", "it", "al", "ar", "st", "to", "nt", "ng",
    "se", "ha", "as", "ou", "io", "le", "ve", "co", "me", "de", "hi", "ri",
    "ro", "ic", "ne", "ea", "ra", "ce", "ll", "be", "ma", "si", "om", "ur",
    "ca", "el", "ta", "la", "ns", "di", "fo", "ho", "pe", "ec", "pr", "no",
    "ct", "us", "ac", "ot", "il", "tr", "ly", "nc", "wa", "we", "do", "go",
    "up", "my", "so",
    "the", "and", "ing", "her", "hat", "his", "tha", "ere", "for", "ent",
    "ion", "you", "was", "ith", "ver", "all", "wit", "thi", "ter", "are",
    "not", "out", "but", "can", "get", "got", "see", "now", "how", "one",
    "our", "who", "him", "had", "has", "have", "here", "there", "this",
    "that", "what", "when", "with", "will", "good", "back", "from", "they",
    "time", "over", "just", "your", "about", "thanks", "hello",
    " the ", " and ", " to ", " of ", " a ", " in ", " is ", " it ", " on ",
    " you ", " i ",
];

/// Compress text with the dictionary scheme. Infallible; unmatched bytes
/// (including multi-byte UTF-8 sequences) pass through as literals.
pub fn dictionary_compress(text: &str) -> Vec<u8> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut literals: Vec<u8> = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        match longest_match(&bytes[pos..]) {
            Some((code, len)) => {
                flush_literals(&mut out, &mut literals);
                out.push(code);
                pos += len;
            }
            None => {
                literals.push(bytes[pos]);
                pos += 1;
            }
        }
    }
    flush_literals(&mut out, &mut literals);
    out
}

/// Expand dictionary-compressed bytes back into text. Fails with
/// `ProtocolError::InvalidText` on unknown codes, truncated escape sequences
/// or a result that is not valid UTF-8.
pub fn dictionary_decompress(bytes: &[u8]) -> Result<String, ProtocolError> {
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len() * 2);
    let mut pos = 0;
    while pos < bytes.len() {
        match bytes[pos] {
            LITERAL_ONE => {
                let byte = bytes.get(pos + 1).ok_or(ProtocolError::InvalidText)?;
                out.push(*byte);
                pos += 2;
            }
            LITERAL_RUN => {
                let len = *bytes.get(pos + 1).ok_or(ProtocolError::InvalidText)? as usize;
                let run = bytes
                    .get(pos + 2..pos + 2 + len)
                    .ok_or(ProtocolError::InvalidText)?;
                out.extend_from_slice(run);
                pos += 2 + len;
            }
            code => {
                let entry = DICTIONARY
                    .get(code as usize)
                    .ok_or(ProtocolError::InvalidText)?;
                out.extend_from_slice(entry.as_bytes());
                pos += 1;
            }
        }
    }
    String::from_utf8(out).map_err(|_| ProtocolError::InvalidText)
}

/// Encode message text into payload bytes for the given compression kind.
pub fn encode_payload(text: &str, compression: CompressionKind) -> Vec<u8> {
    match compression {
        CompressionKind::None => text.as_bytes().to_vec(),
        CompressionKind::Dictionary => dictionary_compress(text),
    }
}

/// Decode payload bytes back into message text.
pub fn decode_payload(bytes: &[u8], compression: CompressionKind) -> Result<String, ProtocolError> {
    match compression {
        CompressionKind::None => {
            String::from_utf8(bytes.to_vec()).map_err(|_| ProtocolError::InvalidText)
        }
        CompressionKind::Dictionary => dictionary_decompress(bytes),
    }
}

fn longest_match(bytes: &[u8]) -> Option<(u8, usize)> {
    let mut best: Option<(u8, usize)> = None;
    for (code, entry) in DICTIONARY.iter().enumerate() {
        let entry = entry.as_bytes();
        if entry.len() > bytes.len() || !bytes.starts_with(entry) {
            continue;
        }
        if best.map_or(true, |(_, len)| entry.len() > len) {
            best = Some((code as u8, entry.len()));
        }
    }
    best
}

fn flush_literals(out: &mut Vec<u8>, literals: &mut Vec<u8>) {
    for chunk in literals.chunks(u8::MAX as usize) {
        if chunk.len() == 1 {
            out.push(LITERAL_ONE);
            out.push(chunk[0]);
        } else {
            out.push(LITERAL_RUN);
            out.push(chunk.len() as u8);
            out.extend_from_slice(chunk);
        }
    }
    literals.clear();
}
