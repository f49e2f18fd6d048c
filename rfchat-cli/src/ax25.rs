//! AX.25 UI frames: shifted callsign address blocks, control 0x03, PID 0xF0.
//! Just enough of the link layer to carry rfchat envelopes point to point;
//! digipeater paths are parsed past but never built.

const ADDR_LEN: usize = 7;
const CONTROL_UI: u8 = 0x03;
const PID_NO_L3: u8 = 0xF0;
/// Smallest parseable frame: two address blocks, control, PID.
const MIN_FRAME_LEN: usize = 2 * ADDR_LEN + 2;

/// Errors building or parsing a UI frame.
#[derive(Debug, thiserror::Error)]
pub enum Ax25Error {
    #[error("invalid callsign '{0}': expected 1-6 letters/digits with optional -0..15 SSID")]
    InvalidCallsign(String),
    #[error("frame too short: {0} bytes")]
    FrameTooShort(usize),
    #[error("not a UI frame (control {control:#04x}, pid {pid:#04x})")]
    NotUiFrame { control: u8, pid: u8 },
    #[error("unterminated address field")]
    UnterminatedAddress,
}

/// Split "CALL-N" into base callsign and SSID, validating both.
fn split_callsign(callsign: &str) -> Result<(&str, u8), Ax25Error> {
    let invalid = || Ax25Error::InvalidCallsign(callsign.to_string());
    let (base, ssid) = match callsign.split_once('-') {
        Some((base, ssid)) => (base, ssid.parse::<u8>().map_err(|_| invalid())?),
        None => (callsign, 0),
    };
    if base.is_empty()
        || base.len() > 6
        || ssid > 15
        || !base.chars().all(|c| c.is_ascii_alphanumeric() && !c.is_ascii_lowercase())
    {
        return Err(invalid());
    }
    Ok((base, ssid))
}

/// Check a callsign without building a frame; lets the input loop reject a
/// bad destination before anything is queued.
pub fn validate_callsign(callsign: &str) -> Result<(), Ax25Error> {
    split_callsign(callsign).map(|_| ())
}

/// Encode one 7-byte address block: callsign characters shifted left one
/// bit, space padded, SSID byte with the extension bit on the final block.
fn encode_address(callsign: &str, last: bool) -> Result<[u8; ADDR_LEN], Ax25Error> {
    let (base, ssid) = split_callsign(callsign)?;
    let mut block = [b' ' << 1; ADDR_LEN];
    for (i, byte) in base.bytes().enumerate() {
        block[i] = byte << 1;
    }
    block[6] = 0x60 | (ssid << 1) | u8::from(last);
    Ok(block)
}

/// Decode a 7-byte address block back into "CALL" or "CALL-N" form.
/// Returns the callsign and whether the extension bit marked it final.
fn decode_address(block: &[u8]) -> (String, bool) {
    let mut callsign = String::with_capacity(9);
    for &byte in &block[..6] {
        let ch = (byte >> 1) as char;
        if ch == ' ' {
            break;
        }
        callsign.push(ch);
    }
    let ssid = (block[6] >> 1) & 0x0F;
    if ssid != 0 {
        callsign.push('-');
        callsign.push_str(&ssid.to_string());
    }
    (callsign, block[6] & 0x01 == 1)
}

/// Build a UI frame: destination, source, control, PID, info bytes.
pub fn build_ui_frame(
    destination: &str,
    source: &str,
    info: &[u8],
) -> Result<Vec<u8>, Ax25Error> {
    let mut out = Vec::with_capacity(MIN_FRAME_LEN + info.len());
    out.extend_from_slice(&encode_address(destination, false)?);
    out.extend_from_slice(&encode_address(source, true)?);
    out.push(CONTROL_UI);
    out.push(PID_NO_L3);
    out.extend_from_slice(info);
    Ok(out)
}

/// Parsed UI frame: (destination, source, info bytes).
pub fn parse_ui_frame(bytes: &[u8]) -> Result<(String, String, Vec<u8>), Ax25Error> {
    if bytes.len() < MIN_FRAME_LEN {
        return Err(Ax25Error::FrameTooShort(bytes.len()));
    }
    let (destination, _) = decode_address(&bytes[..ADDR_LEN]);
    let (source, mut done) = decode_address(&bytes[ADDR_LEN..2 * ADDR_LEN]);

    // Skip any digipeater addresses until the extension bit terminates the
    // address field.
    let mut offset = 2 * ADDR_LEN;
    while !done {
        let end = offset + ADDR_LEN;
        if bytes.len() < end + 2 {
            return Err(Ax25Error::UnterminatedAddress);
        }
        done = bytes[end - 1] & 0x01 == 1;
        offset = end;
    }

    let control = bytes[offset];
    let pid = bytes[offset + 1];
    // Mask the poll/final bit; anything but UI is not ours.
    if control & !0x10 != CONTROL_UI || pid != PID_NO_L3 {
        return Err(Ax25Error::NotUiFrame { control, pid });
    }
    Ok((destination, source, bytes[offset + 2..].to_vec()))
}
