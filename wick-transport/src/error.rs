// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Leif Rydenfalk – https://github.com/Leif-Rydenfalk/cell

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("channel is closed")]
    Closed,
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("i/o error: {0}")]
    Io(String),
    /// The peer answered with an error frame.
    #[error("peer rejected request: {0}")]
    Rejected(String),
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("outbound stream failed: {0}")]
    Outbound(String),
}
