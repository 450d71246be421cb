// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Leif Rydenfalk – https://github.com/Leif-Rydenfalk/cell

use bytes::Bytes;

/// A single frame as the streaming transport sees it: an opaque body plus an
/// optional metadata segment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    pub data: Option<Bytes>,
    pub metadata: Option<Bytes>,
}

impl Payload {
    pub fn new(data: Option<Bytes>, metadata: Option<Bytes>) -> Self {
        Self { data, metadata }
    }

    pub fn data(data: impl Into<Bytes>) -> Self {
        Self {
            data: Some(data.into()),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: impl Into<Bytes>) -> Self {
        self.metadata = Some(metadata.into());
        self
    }
}
