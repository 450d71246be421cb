// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Leif Rydenfalk – https://github.com/Leif-Rydenfalk/cell

use crate::error::WireError;
use crate::metadata::{OPERATION_OFFSET, RESERVED_LEN};
use crate::packet::Packet;
use crate::payload::Payload;
use tracing::debug;
use wick_codec::Codec;
use wick_model::ContextTransport;

/// Index of an exported operation in the component's operation table.
///
/// Encoded as the big-endian index followed by four reserved zero bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperationId(pub u32);

impl OperationId {
    pub fn to_bytes(self) -> [u8; RESERVED_LEN] {
        let mut bytes = [0u8; RESERVED_LEN];
        bytes[..4].copy_from_slice(&self.0.to_be_bytes());
        bytes
    }

    /// `None` when the trailing reserved bytes are not zero.
    pub fn from_bytes(bytes: [u8; RESERVED_LEN]) -> Option<Self> {
        if bytes[4..] != [0u8; 4] {
            return None;
        }
        Some(Self(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])))
    }
}

/// First packet of an invocation: the wrapped packet plus the operation it
/// targets and the call context.
#[derive(Debug, Clone)]
pub struct ContextPacket {
    operation: OperationId,
    packet: Packet,
    context: ContextTransport,
}

impl ContextPacket {
    pub fn new(operation: OperationId, packet: Packet, context: ContextTransport) -> Self {
        Self {
            operation,
            packet,
            context,
        }
    }

    pub fn into_payload<C: Codec>(self, codec: &C) -> Result<Payload, WireError> {
        let mut packet = self.packet;
        packet.set_context(self.context);
        let mut payload = packet.into_payload(codec)?;

        // Packet::into_payload always emits the marker form, so the reserved
        // field is there to overwrite.
        let mut metadata = payload
            .metadata
            .take()
            .ok_or(WireError::MissingMetadata)?
            .to_vec();
        metadata[OPERATION_OFFSET..OPERATION_OFFSET + RESERVED_LEN]
            .copy_from_slice(&self.operation.to_bytes());
        payload.metadata = Some(metadata.into());

        debug!(operation = self.operation.0, "context packet built");
        Ok(payload)
    }
}
