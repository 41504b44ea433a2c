//! WebSocket frame codec (RFC 6455).
//!
//! Encodes outgoing client frames and decodes incoming server frames.
//! Knows nothing about OBS.
//!
//! # Frame Layout
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-------+-+-------------+-------------------------------+
//! |F|R|R|R| opcode|M| Payload len |    Extended payload length    |
//! |I|S|S|S|  (4)  |A|     (7)     |             (16/64)           |
//! |N|V|V|V|       |S|             |   (if payload len==126/127)   |
//! +-+-+-+-+-------+-+-------------+-------------------------------+
//! |                  Masking key (if MASK set)                    |
//! +---------------------------------------------------------------+
//! |                         Payload data                          |
//! +---------------------------------------------------------------+
//! ```
//!
//! Client frames always have FIN and MASK set; no fragmentation is ever
//! produced.

// ============================================================================
// Imports
// ============================================================================

use std::io::ErrorKind;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{Error, Result, TransportError};

// ============================================================================
// Constants
// ============================================================================

const FIN_BIT: u8 = 0x80;
const MASK_BIT: u8 = 0x80;

/// Largest length that fits the 7-bit field.
const MAX_INLINE_LEN: usize = 125;

/// Marker for a 16-bit extended length.
const LEN_16: u8 = 126;

/// Marker for a 64-bit extended length.
const LEN_64: u8 = 127;

/// Largest payload accepted from the server.
pub const MAX_PAYLOAD_LEN: u64 = 64 * 1024 * 1024;

// ============================================================================
// OpCode
// ============================================================================

/// Frame opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    /// Continuation of a fragmented message.
    Continuation = 0x0,
    /// UTF-8 text payload.
    Text = 0x1,
    /// Binary payload.
    Binary = 0x2,
    /// Connection close.
    Close = 0x8,
    /// Ping; must be answered with a pong.
    Ping = 0x9,
    /// Pong.
    Pong = 0xA,
}

impl OpCode {
    /// Parses the low four bits of the first header byte.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ProtocolError::Malformed`] for reserved opcodes.
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0x0 => Ok(Self::Continuation),
            0x1 => Ok(Self::Text),
            0x2 => Ok(Self::Binary),
            0x8 => Ok(Self::Close),
            0x9 => Ok(Self::Ping),
            0xA => Ok(Self::Pong),
            other => Err(Error::malformed(format!("reserved opcode 0x{other:X}"))),
        }
    }

    /// Returns `true` for close, ping and pong.
    #[inline]
    #[must_use]
    pub const fn is_control(self) -> bool {
        matches!(self, Self::Close | Self::Ping | Self::Pong)
    }
}

// ============================================================================
// Frame
// ============================================================================

/// A decoded WebSocket frame.
///
/// `payload` is always the unmasked application data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Final fragment flag.
    pub fin: bool,
    /// Frame opcode.
    pub opcode: OpCode,
    /// Masking key, present only if the frame was masked on the wire.
    pub mask: Option<[u8; 4]>,
    /// Unmasked payload.
    pub payload: Vec<u8>,
}

impl Frame {
    /// Returns `true` if the frame was masked on the wire.
    #[inline]
    #[must_use]
    pub const fn is_masked(&self) -> bool {
        self.mask.is_some()
    }

    /// Returns the status code of a close frame, if it carries one.
    #[must_use]
    pub fn close_code(&self) -> Option<u16> {
        match (self.opcode, self.payload.as_slice()) {
            (OpCode::Close, [hi, lo, ..]) => Some(u16::from_be_bytes([*hi, *lo])),
            _ => None,
        }
    }
}

// ============================================================================
// Encoding
// ============================================================================

/// Encodes a client frame with a fresh random mask key.
#[must_use]
pub fn encode(opcode: OpCode, payload: &[u8]) -> Vec<u8> {
    encode_with_mask(opcode, payload, rand::random())
}

/// Encodes a client frame with the given mask key.
#[must_use]
pub fn encode_with_mask(opcode: OpCode, payload: &[u8], mask: [u8; 4]) -> Vec<u8> {
    write_frame(opcode, payload, Some(mask))
}

/// Lays out a single FIN frame, masking the payload when a key is given.
pub(crate) fn write_frame(opcode: OpCode, payload: &[u8], mask: Option<[u8; 4]>) -> Vec<u8> {
    let len = payload.len();
    let mut frame = Vec::with_capacity(len + 14);

    frame.push(FIN_BIT | opcode as u8);

    let mask_bit = if mask.is_some() { MASK_BIT } else { 0 };
    if len <= MAX_INLINE_LEN {
        frame.push(mask_bit | len as u8);
    } else if let Ok(len16) = u16::try_from(len) {
        frame.push(mask_bit | LEN_16);
        frame.extend_from_slice(&len16.to_be_bytes());
    } else {
        frame.push(mask_bit | LEN_64);
        frame.extend_from_slice(&(len as u64).to_be_bytes());
    }

    match mask {
        Some(key) => {
            frame.extend_from_slice(&key);
            let start = frame.len();
            frame.extend_from_slice(payload);
            apply_mask(&mut frame[start..], key);
        }
        None => frame.extend_from_slice(payload),
    }

    frame
}

/// XORs `data` in place with the repeating 4-byte key.
///
/// Masking and unmasking are the same operation.
#[inline]
pub fn apply_mask(data: &mut [u8], key: [u8; 4]) {
    for (i, byte) in data.iter_mut().enumerate() {
        *byte ^= key[i % 4];
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// Reads one frame from `reader`.
///
/// Returns `Ok(None)` if the stream ended cleanly before the first header
/// byte.
///
/// # Errors
///
/// - [`TransportError::Truncated`] if the stream ends mid-frame
/// - [`crate::ProtocolError::Malformed`] for reserved opcodes or oversized payloads
/// - [`Error::Io`] for other read failures
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Frame>>
where
    R: AsyncRead + Unpin,
{
    let mut first = [0u8; 1];
    if reader.read(&mut first).await? == 0 {
        return Ok(None);
    }

    let mut second = [0u8; 1];
    read_exact(reader, &mut second).await?;

    let fin = first[0] & FIN_BIT != 0;
    let opcode = OpCode::from_u8(first[0] & 0x0F)?;
    let masked = second[0] & MASK_BIT != 0;

    let len = match second[0] & 0x7F {
        LEN_16 => {
            let mut buf = [0u8; 2];
            read_exact(reader, &mut buf).await?;
            u64::from(u16::from_be_bytes(buf))
        }
        LEN_64 => {
            let mut buf = [0u8; 8];
            read_exact(reader, &mut buf).await?;
            u64::from_be_bytes(buf)
        }
        short => u64::from(short),
    };

    if len > MAX_PAYLOAD_LEN {
        return Err(Error::malformed(format!(
            "frame payload of {len} bytes exceeds {MAX_PAYLOAD_LEN}"
        )));
    }

    let mask = if masked {
        let mut key = [0u8; 4];
        read_exact(reader, &mut key).await?;
        Some(key)
    } else {
        None
    };

    let mut payload = vec![0u8; len as usize];
    read_exact(reader, &mut payload).await?;

    if let Some(key) = mask {
        apply_mask(&mut payload, key);
    }

    Ok(Some(Frame {
        fin,
        opcode,
        mask,
        payload,
    }))
}

/// `read_exact` with EOF mapped to [`TransportError::Truncated`].
async fn read_exact<R>(reader: &mut R, buf: &mut [u8]) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    match reader.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(TransportError::Truncated.into()),
        Err(e) => Err(e.into()),
    }
}

// ============================================================================
// Tests
// ============================================================================
