// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Leif Rydenfalk – https://github.com/Leif-Rydenfalk/cell

use crate::error::TransportError;
use futures::stream::BoxStream;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use wick_core::Payload;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Frames flowing in either direction of a channel request.
pub type PayloadStream = BoxStream<'static, Result<Payload, TransportError>>;

pub const KEEP_ALIVE: Duration = Duration::from_secs(10);
pub const LIFETIME: Duration = Duration::from_secs(20);

/// Parameters sent with the connection setup frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupParams {
    pub keep_alive: Duration,
    pub lifetime: Duration,
    pub data_mime_type: String,
    pub metadata_mime_type: String,
}

impl Default for SetupParams {
    fn default() -> Self {
        Self {
            keep_alive: KEEP_ALIVE,
            lifetime: LIFETIME,
            data_mime_type: "application/x-msgpack".to_string(),
            metadata_mime_type: "application/x-msgpack".to_string(),
        }
    }
}

/// An open connection to a running component.
///
/// Every `request_channel` call is an independent stream: implementations
/// must keep frames of concurrent requests apart (stream ids, a task per
/// request, ...). Packet metadata only names a port, so it cannot
/// disambiguate two interleaved invocations on its own.
pub trait Channel: Send + Sync {
    /// Single request, single reply.
    fn request_response(&self, payload: Payload) -> BoxFuture<'_, Result<Payload, TransportError>>;

    /// Bidirectional stream. An `Err` item on the outbound side aborts the
    /// request and is delivered as the terminal item of the returned stream.
    /// Dropping the returned stream cancels the request.
    fn request_channel(&self, payloads: PayloadStream) -> PayloadStream;

    /// Idempotent. Requests in flight fail with `TransportError::Closed`.
    fn close(&self);

    fn is_closed(&self) -> bool;
}

pub trait Connector: Send + Sync {
    fn connect(&self, params: SetupParams) -> BoxFuture<'_, Result<Arc<dyn Channel>, TransportError>>;
}
