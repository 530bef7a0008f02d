//! PN532 information-frame codec.
//!
//! Wire format (host → chip uses `D4`, chip → host uses `D5`):
//! ```text
//! ┌──────────┬───────┬─────────────┬─────┬─────┬───────────┬─────┬──────┐
//! │ Preamble │ Start │ LEN  LCS    │ TFI │ CMD │ PD0..PDn  │ DCS │ Post │
//! │ 55 55 55 │ 00 FF │ 1B   1B     │ 1B  │ 1B  │ n bytes   │ 1B  │ 00   │
//! │ 00       │       │             │     │     │           │     │      │
//! └──────────┴───────┴─────────────┴─────┴─────┴───────────┴─────┴──────┘
//!
//! Extended length (LEN ≥ 256):
//!                    │ FF FF LENH LENL LCS │
//! ```
//!
//! `LEN` counts TFI + CMD + payload.  `LEN + LCS` (or `LENH + LENL + LCS`)
//! and `TFI + CMD + ΣPD + DCS` are both ≡ 0 mod 256.
//!
//! Outbound frames are streamed straight to the [`Link`] segment by
//! segment so a caller's payload never has to be copied into a frame
//! buffer.  [`encode_frame`] produces the same bytes into a slice.

use core::time::Duration;

use crate::error::TransportFault;
use crate::link::{Link, section_timeout};
use crate::transport::Transport;

/// Leading bytes of every host frame, up to and including the start code.
pub const PREAMBLE: [u8; 6] = [0x55, 0x55, 0x55, 0x00, 0x00, 0xFF];

/// Length-field prefix announcing an extended-length frame.
pub const EXTENDED_MARKER: [u8; 2] = [0xFF, 0xFF];

/// Frame identifier for host → chip frames.
pub const HOST_TO_CHIP: u8 = 0xD4;

/// Frame identifier for chip → host frames.
pub const CHIP_TO_HOST: u8 = 0xD5;

/// Bytes that follow the start code in an ACK frame.
pub const ACK_BODY: [u8; 3] = [0x00, 0xFF, 0x00];

/// Bytes that follow the start code in a NACK frame.
pub const NACK_BODY: [u8; 3] = [0xFF, 0x00, 0x00];

/// A complete ACK frame as the host sends it (baud-rate change handshake).
pub const ACK_FRAME: [u8; 6] = [0x00, 0x00, 0xFF, 0x00, 0xFF, 0x00];

/// Length fields from this value upward use the extended form.
pub const EXTENDED_THRESHOLD: usize = 0x100;

/// Largest length field value (TFI + CMD + payload).
pub const MAX_LENGTH_FIELD: usize = 0xFFFF;

/// Largest payload a single frame can carry.
pub const MAX_PAYLOAD: usize = MAX_LENGTH_FIELD - 2;

/// Preamble + start + extended length + TFI + CMD.
const MAX_HEADER: usize = PREAMBLE.len() + 5 + 2;

/// Encoded frame header, everything before the payload.
pub struct FrameHeader {
    bytes: [u8; MAX_HEADER],
    len: usize,
}

impl FrameHeader {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// True when the extended length form was chosen.
    pub fn is_extended(&self) -> bool {
        self.bytes[PREAMBLE.len()..PREAMBLE.len() + 2] == EXTENDED_MARKER
    }
}

/// Build the header for a host frame carrying `payload_len` bytes.
///
/// Returns `None` if the payload does not fit a single frame.
pub fn encode_header(cmd: u8, payload_len: usize) -> Option<FrameHeader> {
    if payload_len > MAX_PAYLOAD {
        return None;
    }
    let field = payload_len + 2;

    let mut bytes = [0u8; MAX_HEADER];
    bytes[..PREAMBLE.len()].copy_from_slice(&PREAMBLE);
    let mut n = PREAMBLE.len();

    if field >= EXTENDED_THRESHOLD {
        let [hi, lo] = (field as u16).to_be_bytes();
        bytes[n..n + 5].copy_from_slice(&[
            EXTENDED_MARKER[0],
            EXTENDED_MARKER[1],
            hi,
            lo,
            0u8.wrapping_sub(hi).wrapping_sub(lo),
        ]);
        n += 5;
    } else {
        let len = field as u8;
        bytes[n] = len;
        bytes[n + 1] = 0u8.wrapping_sub(len);
        n += 2;
    }

    bytes[n] = HOST_TO_CHIP;
    bytes[n + 1] = cmd;
    n += 2;

    Some(FrameHeader { bytes, len: n })
}

/// Wrapping sum of every byte in `segments`.
fn sum(segments: &[&[u8]]) -> u8 {
    segments
        .iter()
        .flat_map(|s| s.iter())
        .fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Data checksum: two's complement of `tfi + cmd + Σpayload`.
pub fn data_checksum(tfi: u8, cmd: u8, segments: &[&[u8]]) -> u8 {
    0u8.wrapping_sub(tfi.wrapping_add(cmd).wrapping_add(sum(segments)))
}

/// Checksum and postamble closing a host frame.
pub fn encode_trailer(cmd: u8, first: &[u8], second: &[u8]) -> [u8; 2] {
    [data_checksum(HOST_TO_CHIP, cmd, &[first, second]), 0x00]
}

/// Encode a complete host frame into `out`.
///
/// Returns the number of bytes written, or `None` if `out` is too small
/// or the payload exceeds [`MAX_PAYLOAD`].
pub fn encode_frame(cmd: u8, first: &[u8], second: &[u8], out: &mut [u8]) -> Option<usize> {
    let header = encode_header(cmd, first.len() + second.len())?;
    let head = header.as_bytes();
    let total = head.len() + first.len() + second.len() + 2;
    if total > out.len() {
        return None;
    }

    let mut n = 0;
    for part in [head, first, second, &encode_trailer(cmd, first, second)[..]] {
        out[n..n + part.len()].copy_from_slice(part);
        n += part.len();
    }
    Some(n)
}

/// Stream a host frame to the link.
pub fn write_frame<T: Transport>(
    link: &mut Link<T>,
    cmd: u8,
    first: &[u8],
    second: &[u8],
) -> Result<(), TransportFault> {
    let header = encode_header(cmd, first.len() + second.len()).ok_or(TransportFault::Space)?;
    link.write_all(header.as_bytes())?;
    link.write_all(first)?;
    link.write_all(second)?;
    link.write_all(&encode_trailer(cmd, first, second))
}

/// Read one chip frame answering command `expected` (the response id,
/// i.e. command + 1).
///
/// The payload lands in `first`, overflowing into `second`.  Returns the
/// payload length.  `timeout` bounds the wait for the frame to start; the
/// remaining sections get a length-proportional allowance.
pub fn read_frame<T: Transport>(
    link: &mut Link<T>,
    expected: u8,
    first: &mut [u8],
    second: &mut [u8],
    timeout: Duration,
) -> Result<usize, TransportFault> {
    link.scan_preamble(timeout)?;

    let mut head = [0u8; 7];
    link.read_exact(&mut head[..4], section_timeout(4))?;

    let (field, tfi, cmd) = if head[..2] == EXTENDED_MARKER {
        link.read_exact(&mut head[4..], section_timeout(3))?;
        if head[2].wrapping_add(head[3]).wrapping_add(head[4]) != 0 {
            return Err(TransportFault::Header);
        }
        (usize::from(u16::from_be_bytes([head[2], head[3]])), head[5], head[6])
    } else {
        if head[0].wrapping_add(head[1]) != 0 {
            return Err(TransportFault::Header);
        }
        (usize::from(head[0]), head[2], head[3])
    };

    if tfi != CHIP_TO_HOST {
        return Err(TransportFault::Header);
    }
    if cmd != expected {
        return Err(TransportFault::CommandMismatch);
    }
    if field < 2 {
        return Err(TransportFault::Header);
    }

    let len = field - 2;
    if len > first.len() + second.len() {
        return Err(TransportFault::Space);
    }

    let n1 = len.min(first.len());
    let n2 = len - n1;
    link.read_exact(&mut first[..n1], section_timeout(n1))?;
    link.read_exact(&mut second[..n2], section_timeout(n2))?;

    let mut trailer = [0u8; 2];
    link.read_exact(&mut trailer, section_timeout(2))?;

    let total = CHIP_TO_HOST
        .wrapping_add(cmd)
        .wrapping_add(sum(&[&first[..n1], &second[..n2]]))
        .wrapping_add(trailer[0]);
    if total != 0 {
        return Err(TransportFault::Checksum);
    }
    if trailer[1] != 0 {
        return Err(TransportFault::Postamble);
    }

    Ok(len)
}

/// Build a chip → host frame.  Used by simulators and tests.
pub fn encode_response(cmd: u8, payload: &[u8]) -> Vec<u8> {
    let field = payload.len() + 2;
    let mut out = Vec::with_capacity(field + 10);
    out.extend_from_slice(&[0x00, 0x00, 0xFF]);
    if field >= EXTENDED_THRESHOLD {
        let [hi, lo] = (field as u16).to_be_bytes();
        out.extend_from_slice(&[0xFF, 0xFF, hi, lo, 0u8.wrapping_sub(hi).wrapping_sub(lo)]);
    } else {
        out.extend_from_slice(&[field as u8, 0u8.wrapping_sub(field as u8)]);
    }
    out.push(CHIP_TO_HOST);
    out.push(cmd);
    out.extend_from_slice(payload);
    out.push(data_checksum(CHIP_TO_HOST, cmd, &[payload]));
    out.push(0x00);
    out
}
