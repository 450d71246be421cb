// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Leif Rydenfalk – https://github.com/Leif-Rydenfalk/cell

//! Binary metadata envelope carried on every packet.
//!
//! ```text
//! [0xCA][len: u24 BE][reserved: 8][flags: u8][port_len: u16 BE][port][ctx_len: u16 BE][ctx]
//! \______ extension header ______/\___________________ inner layout ____________________/
//! ```
//!
//! `len` counts the reserved field plus the inner layout. The reserved field
//! is zero on plain packets and carries the operation id on the first packet
//! of an invocation. Older peers emit the inner layout alone; decoding accepts
//! both and tells them apart by the leading marker byte.

use crate::context_packet::OperationId;
use crate::error::WireError;
use bytes::{BufMut, Bytes, BytesMut};

pub const EXTENSION_MARKER: u8 = 0xCA;
/// Marker byte plus the 24-bit length.
pub const EXTENSION_HEADER_LEN: usize = 4;
pub const RESERVED_LEN: usize = 8;
/// Where the operation id lands inside a marker-prefixed envelope.
pub const OPERATION_OFFSET: usize = EXTENSION_HEADER_LEN;

const MAX_FIELD_LEN: usize = u16::MAX as usize;
const MAX_EXTENSION_LEN: usize = 0x00FF_FFFF;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WickMetadata {
    pub flags: u8,
    pub port: String,
    /// Encoded context blob. An empty blob decodes as `None`.
    pub context: Option<Bytes>,
}

impl WickMetadata {
    pub fn new(flags: u8, port: impl Into<String>, context: Option<Bytes>) -> Self {
        Self {
            flags,
            port: port.into(),
            context,
        }
    }

    /// Inner layout only, without the extension header.
    pub fn encode_inner(&self) -> Result<Vec<u8>, WireError> {
        let port = self.port.as_bytes();
        let context = self.context.as_deref().unwrap_or_default();
        check_len("port name", port.len(), MAX_FIELD_LEN)?;
        check_len("context", context.len(), MAX_FIELD_LEN)?;

        let mut buf = Vec::with_capacity(1 + 2 + port.len() + 2 + context.len());
        buf.push(self.flags);
        buf.extend_from_slice(&(port.len() as u16).to_be_bytes());
        buf.extend_from_slice(port);
        buf.extend_from_slice(&(context.len() as u16).to_be_bytes());
        buf.extend_from_slice(context);
        Ok(buf)
    }

    /// Full envelope: extension header, zeroed reserved field, inner layout.
    pub fn encode(&self) -> Result<Bytes, WireError> {
        let inner = self.encode_inner()?;
        let declared = RESERVED_LEN + inner.len();
        check_len("extension", declared, MAX_EXTENSION_LEN)?;

        let mut buf = BytesMut::with_capacity(EXTENSION_HEADER_LEN + declared);
        buf.put_u8(EXTENSION_MARKER);
        buf.put_uint(declared as u64, 3);
        buf.put_bytes(0, RESERVED_LEN);
        buf.put_slice(&inner);
        Ok(buf.freeze())
    }

    pub fn decode(buf: &[u8]) -> Result<Self, WireError> {
        let mut reader = match buf.first() {
            Some(&EXTENSION_MARKER) => Reader::after_extension(buf)?,
            Some(_) => Reader::new(buf),
            None => {
                return Err(WireError::Truncated {
                    offset: 0,
                    needed: 1,
                    available: 0,
                })
            }
        };

        let flags = reader.take(1)?[0];
        let port_len = reader.read_u16()? as usize;
        let port = std::str::from_utf8(reader.take(port_len)?)?.to_string();
        let context_len = reader.read_u16()? as usize;
        let context = reader.take(context_len)?;
        reader.expect_consumed()?;

        Ok(Self {
            flags,
            port,
            context: (!context.is_empty()).then(|| Bytes::copy_from_slice(context)),
        })
    }

    /// Reads the operation id out of a marker-prefixed envelope. Legacy
    /// envelopes have nowhere to put one.
    pub fn operation_id(buf: &[u8]) -> Option<OperationId> {
        if buf.first() != Some(&EXTENSION_MARKER) {
            return None;
        }
        let field = buf.get(OPERATION_OFFSET..OPERATION_OFFSET + RESERVED_LEN)?;
        let mut bytes = [0u8; RESERVED_LEN];
        bytes.copy_from_slice(field);
        OperationId::from_bytes(bytes)
    }
}

fn check_len(field: &'static str, len: usize, max: usize) -> Result<(), WireError> {
    if len > max {
        return Err(WireError::TooLong { field, len, max });
    }
    Ok(())
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
    /// Set when the region was sized by an extension header.
    declared: Option<usize>,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            declared: None,
        }
    }

    /// Positions past the extension header and reserved field, bounding the
    /// readable region by the declared length.
    fn after_extension(buf: &'a [u8]) -> Result<Self, WireError> {
        let mut header = Reader::new(buf);
        let raw = header.take(EXTENSION_HEADER_LEN)?;
        let declared = u32::from_be_bytes([0, raw[1], raw[2], raw[3]]) as usize;
        if declared < RESERVED_LEN {
            return Err(WireError::BadExtensionLength {
                declared,
                reserved: RESERVED_LEN,
            });
        }
        header.take(declared)?;

        Ok(Self {
            buf: &buf[..EXTENSION_HEADER_LEN + declared],
            pos: EXTENSION_HEADER_LEN + RESERVED_LEN,
            declared: Some(declared),
        })
    }

    /// The declared length must cover the reserved field and inner layout
    /// exactly. Bare inner layouts carry no length to check.
    fn expect_consumed(&self) -> Result<(), WireError> {
        match self.declared {
            Some(declared) if self.pos != self.buf.len() => Err(WireError::ExtensionLengthMismatch {
                declared,
                actual: self.pos - EXTENSION_HEADER_LEN,
            }),
            _ => Ok(()),
        }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], WireError> {
        let available = self.buf.len() - self.pos;
        if n > available {
            return Err(WireError::Truncated {
                offset: self.pos,
                needed: n,
                available,
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u16(&mut self) -> Result<u16, WireError> {
        let raw = self.take(2)?;
        Ok(u16::from_be_bytes([raw[0], raw[1]]))
    }
}
