// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Leif Rydenfalk – https://github.com/Leif-Rydenfalk/cell

use thiserror::Error;
use wick_codec::CodecError;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("truncated metadata: needed {needed} bytes at offset {offset}, only {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("port name is not valid UTF-8")]
    InvalidPort(#[from] std::str::Utf8Error),
    #[error("{field} is {len} bytes, the envelope allows at most {max}")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
    #[error("extension header declares {declared} bytes, less than the {reserved}-byte reserved field")]
    BadExtensionLength { declared: usize, reserved: usize },
    #[error("extension header declares {declared} bytes but the envelope holds {actual}")]
    ExtensionLengthMismatch { declared: usize, actual: usize },
    #[error("payload came in with no metadata")]
    MissingMetadata,
    #[error(transparent)]
    Codec(#[from] CodecError),
}
