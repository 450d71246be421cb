// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Leif Rydenfalk – https://github.com/Leif-Rydenfalk/cell

use crate::error::WireError;
use crate::flags;
use crate::metadata::WickMetadata;
use crate::payload::Payload;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, trace};
use wick_codec::Codec;
use wick_model::ContextTransport;

/// The unit of data on a wick channel.
///
/// `data: None` is not the same as an empty body: control packets (done,
/// brackets) carry no data at all.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    pub port: String,
    pub data: Option<Bytes>,
    pub flags: u8,
    pub context: Option<ContextTransport>,
}

impl Packet {
    pub fn new(port: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            port: port.into(),
            data: Some(data.into()),
            flags: 0,
            context: None,
        }
    }

    pub fn encode<C, T>(port: impl Into<String>, value: &T, codec: &C) -> Result<Self, WireError>
    where
        C: Codec,
        T: Serialize + ?Sized,
    {
        Ok(Self::new(port, codec.encode(value)?))
    }

    pub fn done(port: impl Into<String>) -> Self {
        Self::signal(port, flags::DONE)
    }

    pub fn open_bracket(port: impl Into<String>) -> Self {
        Self::signal(port, flags::OPEN_BRACKET)
    }

    pub fn close_bracket(port: impl Into<String>) -> Self {
        Self::signal(port, flags::CLOSE_BRACKET)
    }

    fn signal(port: impl Into<String>, flags: u8) -> Self {
        Self {
            port: port.into(),
            data: None,
            flags,
            context: None,
        }
    }

    pub fn with_flags(mut self, flags: u8) -> Self {
        self.flags = flags;
        self
    }

    pub fn set_context(&mut self, context: ContextTransport) {
        self.context = Some(context);
    }

    pub fn is_done(&self) -> bool {
        self.flags & flags::DONE != 0
    }

    pub fn is_open_bracket(&self) -> bool {
        self.flags & flags::OPEN_BRACKET != 0
    }

    pub fn is_close_bracket(&self) -> bool {
        self.flags & flags::CLOSE_BRACKET != 0
    }

    /// Decodes the body. `Ok(None)` for control packets.
    pub fn decode<C, T>(&self, codec: &C) -> Result<Option<T>, WireError>
    where
        C: Codec,
        T: DeserializeOwned,
    {
        match &self.data {
            Some(data) => Ok(Some(codec.decode(data)?)),
            None => Ok(None),
        }
    }

    pub fn into_payload<C: Codec>(self, codec: &C) -> Result<Payload, WireError> {
        let context = match &self.context {
            Some(ctx) => {
                trace!(port = %self.port, ?ctx, "packet context");
                Some(Bytes::from(codec.encode(ctx)?))
            }
            None => None,
        };
        let metadata = WickMetadata::new(self.flags, self.port, context).encode()?;
        trace!(len = metadata.len(), "packet metadata");

        Ok(Payload {
            data: self.data,
            metadata: Some(metadata),
        })
    }

    /// Rebuilds a packet from an inbound frame. Frames without metadata are
    /// a protocol violation. A context blob that isn't a [`ContextTransport`]
    /// belongs to the peer and is dropped.
    pub fn from_payload<C: Codec>(payload: Payload, codec: &C) -> Result<Self, WireError> {
        let raw = payload.metadata.ok_or(WireError::MissingMetadata)?;
        let metadata = WickMetadata::decode(&raw)?;
        let context = metadata.context.and_then(|blob| match codec.decode(&blob) {
            Ok(ctx) => Some(ctx),
            Err(e) => {
                debug!(port = %metadata.port, len = blob.len(), error = %e, "ignoring foreign packet context");
                None
            }
        });

        Ok(Self {
            port: metadata.port,
            data: payload.data,
            flags: metadata.flags,
            context,
        })
    }
}
