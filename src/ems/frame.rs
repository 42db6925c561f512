//! # EMS Frame Codec
//!
//! This module decodes and renders EMS bus frames. A frame starts at the
//! source address; start/stop bytes and the checksum are handled by the
//! transport framer before a buffer reaches [`parse_frame`].
//!
//! Two generations share the header layout `src dst type offset`:
//!
//! - classic EMS carries a 1-byte type id below 0xF0 and the payload
//!   directly after the header;
//! - EMS-plus is signalled by a wire type byte of 0xF0 or above (0xFF in
//!   practice) and carries its real 16-bit type id inside the payload.
//!   Read requests (destination bit 7 set) are laid out
//!   `len type_hi type_lo`, writes and responses `type_hi type_lo data…`.
//!
//! The decoded [`TypeId`] keeps the two id spaces apart so that dispatch
//! tables never confuse a classic id with the low byte of an extended one.

use crate::constants::{ADDR_PC, EMS_PLUS_MARKER, EMS_PLUS_TYPE, RESPONSE_EXPECTED};
use crate::error::EmsError;
use crate::util::hex::format_hex_prefixed;
use bytes::{BufMut, BytesMut};
use nom::number::complete::{be_u16, be_u8};
use nom::IResult;
use std::fmt;

/// Message type id, keeping classic and EMS-plus ids in separate spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeId {
    Classic(u8),
    Extended(u16),
}

impl TypeId {
    /// Classifies a raw id: values below 0xF0 are classic, everything else
    /// is an EMS-plus id.
    pub fn from_raw(raw: u16) -> TypeId {
        if raw < EMS_PLUS_MARKER as u16 {
            TypeId::Classic(raw as u8)
        } else {
            TypeId::Extended(raw)
        }
    }

    /// The id as a 16-bit value, usable as a dispatch key.
    pub fn raw(&self) -> u16 {
        match *self {
            TypeId::Classic(t) => t as u16,
            TypeId::Extended(t) => t,
        }
    }

    pub fn is_extended(&self) -> bool {
        matches!(self, TypeId::Extended(_))
    }
}

/// A decoded EMS frame. Immutable once constructed.
///
/// `dest` is the raw destination byte; bit 7 is the response-expected flag,
/// not part of the peer address. For EMS-plus read requests the payload
/// holds the single remaining-length byte, mirroring the wire form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmsFrame {
    pub source: u8,
    pub dest: u8,
    pub type_id: TypeId,
    pub offset: u8,
    pub payload: Vec<u8>,
}

impl EmsFrame {
    /// Builds an outgoing frame originating from this node.
    pub fn request(dest: u8, type_raw: u16, offset: u8, payload: Vec<u8>, expect_response: bool) -> EmsFrame {
        EmsFrame {
            source: ADDR_PC,
            dest: if expect_response {
                dest | RESPONSE_EXPECTED
            } else {
                dest & !RESPONSE_EXPECTED
            },
            type_id: TypeId::from_raw(type_raw),
            offset,
            payload,
        }
    }

    /// Builds a read request asking for `remaining` bytes at `offset`.
    pub fn read_request(dest: u8, type_raw: u16, offset: u8, remaining: u8) -> EmsFrame {
        EmsFrame::request(dest, type_raw, offset, vec![remaining], true)
    }

    /// Builds a write carrying `data` at `offset`.
    pub fn write(dest: u8, type_raw: u16, offset: u8, data: Vec<u8>) -> EmsFrame {
        EmsFrame::request(dest, type_raw, offset, data, false)
    }

    /// Whether the sender expects a response to this frame.
    pub fn expects_response(&self) -> bool {
        self.dest & RESPONSE_EXPECTED != 0
    }

    /// The destination peer address with the response flag stripped.
    pub fn dest_address(&self) -> u8 {
        self.dest & !RESPONSE_EXPECTED
    }

    /// The message type as a 16-bit dispatch key.
    pub fn type_raw(&self) -> u16 {
        self.type_id.raw()
    }

    /// Renders the frame for the wire.
    ///
    /// `omit_sender` leaves out the leading source byte for transports whose
    /// converter inserts it on its own.
    pub fn to_wire(&self, omit_sender: bool) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(6 + self.payload.len());

        if !omit_sender {
            buf.put_u8(self.source);
        }
        buf.put_u8(self.dest);

        match self.type_id {
            TypeId::Classic(t) => {
                buf.put_u8(t);
                buf.put_u8(self.offset);
                buf.put_slice(&self.payload);
            }
            TypeId::Extended(t) => {
                buf.put_u8(EMS_PLUS_TYPE);
                buf.put_u8(self.offset);
                if self.expects_response() {
                    // read request: length byte precedes the type id
                    buf.put_u8(self.payload.first().copied().unwrap_or(0));
                    buf.put_u16(t);
                } else {
                    buf.put_u16(t);
                    buf.put_slice(&self.payload);
                }
            }
        }

        buf.to_vec()
    }
}

impl fmt::Display for EmsFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "source 0x{:02x}, dest 0x{:02x}, type 0x{:04x}, offset {}, data: {}",
            self.source,
            self.dest,
            self.type_raw(),
            self.offset,
            format_hex_prefixed(&self.payload)
        )
    }
}

/// Uses the `nom` crate to split the frame header off the buffer.
fn frame_header(input: &[u8]) -> IResult<&[u8], (u8, u8, u8, u8)> {
    let (input, source) = be_u8(input)?;
    let (input, dest) = be_u8(input)?;
    let (input, type_byte) = be_u8(input)?;
    let (input, offset) = be_u8(input)?;
    Ok((input, (source, dest, type_byte, offset)))
}

fn extended_type(input: &[u8]) -> IResult<&[u8], u16> {
    be_u16(input)
}

/// Parses one framed EMS message.
///
/// Fails with [`EmsError::MalformedFrame`] when the buffer is shorter than
/// the four-byte header. A wire type byte of 0xF0 or above only counts as
/// EMS-plus when the buffer is long enough for the embedded type id (7 bytes
/// for a read request, 6 for a write); shorter frames, notably the 4-byte
/// 0xFF acknowledgements, decode as classic.
pub fn parse_frame(buf: &[u8]) -> Result<EmsFrame, EmsError> {
    if buf.len() < 4 {
        return Err(EmsError::MalformedFrame(buf.len()));
    }

    let (rest, (source, dest, type_byte, offset)) =
        frame_header(buf).map_err(|e| EmsError::FrameParse(e.to_string()))?;

    let is_read = dest & RESPONSE_EXPECTED != 0;
    let plus_min = if is_read { 7 } else { 6 };
    let is_plus = type_byte >= EMS_PLUS_MARKER && buf.len() >= plus_min;

    if !is_plus {
        return Ok(EmsFrame {
            source,
            dest,
            type_id: TypeId::Classic(type_byte),
            offset,
            payload: rest.to_vec(),
        });
    }

    if is_read {
        let (rest, length) = be_u8(rest).map_err(|e: nom::Err<nom::error::Error<&[u8]>>| {
            EmsError::FrameParse(e.to_string())
        })?;
        let (_, ext) = extended_type(rest).map_err(|e| EmsError::FrameParse(e.to_string()))?;
        Ok(EmsFrame {
            source,
            dest,
            type_id: TypeId::Extended(ext),
            offset,
            payload: vec![length],
        })
    } else {
        let (rest, ext) = extended_type(rest).map_err(|e| EmsError::FrameParse(e.to_string()))?;
        Ok(EmsFrame {
            source,
            dest,
            type_id: TypeId::Extended(ext),
            offset,
            payload: rest.to_vec(),
        })
    }
}
