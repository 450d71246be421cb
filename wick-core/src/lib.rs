// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Leif Rydenfalk – https://github.com/Leif-Rydenfalk/cell

pub mod context_packet;
pub mod error;
pub mod metadata;
pub mod packet;
pub mod payload;

pub use context_packet::{ContextPacket, OperationId};
pub use error::WireError;
pub use metadata::WickMetadata;
pub use packet::Packet;
pub use payload::Payload;

/// Packet control bits. This is a mask: several may be set at once.
pub mod flags {
    /// Last packet on its port.
    pub const DONE: u8 = 0b1000_0000;
    pub const OPEN_BRACKET: u8 = 0b0100_0000;
    pub const CLOSE_BRACKET: u8 = 0b0010_0000;
}
