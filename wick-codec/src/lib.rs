// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Leif Rydenfalk – https://github.com/Leif-Rydenfalk/cell

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("encode failed: {0}")]
    Encode(String),
    #[error("decode failed: {0}")]
    Decode(String),
}

/// Trait for encoding/decoding structured values.
///
/// The host never looks inside a packet body; it only needs a codec to
/// produce context blobs and setup payloads, and to let callers turn
/// packet data back into typed values.
pub trait Codec: Send + Sync {
    fn mime_type(&self) -> &'static str;
    fn encode<T: Serialize + ?Sized>(&self, item: &T) -> Result<Vec<u8>, CodecError>;
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError>;
}

/// MessagePack, the format wick components speak on every port.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessagePackCodec;

impl Codec for MessagePackCodec {
    fn mime_type(&self) -> &'static str {
        "application/x-msgpack"
    }

    fn encode<T: Serialize + ?Sized>(&self, item: &T) -> Result<Vec<u8>, CodecError> {
        // Structs go out as maps so field names survive the trip to the guest.
        rmp_serde::to_vec_named(item).map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        rmp_serde::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Reference {
        origin: String,
        target: String,
    }

    #[test]
    fn integers_use_compact_encoding() {
        let bytes = MessagePackCodec.encode(&42).unwrap();
        assert_eq!(bytes, vec![42]);
        let value: i64 = MessagePackCodec.decode(&bytes).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn structs_are_encoded_as_maps() {
        let reference = Reference {
            origin: "self".into(),
            target: "math".into(),
        };
        let bytes = MessagePackCodec.encode(&reference).unwrap();
        // fixmap with two entries
        assert_eq!(bytes[0], 0x82);

        let as_json: serde_json::Value = MessagePackCodec.decode(&bytes).unwrap();
        assert_eq!(as_json["target"], "math");
    }

    #[test]
    fn garbage_fails_to_decode() {
        let err = MessagePackCodec.decode::<Reference>(&[0xc1]).unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));
    }
}
