// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Leif Rydenfalk – https://github.com/Leif-Rydenfalk/cell

//! In-process channel. Requests are served by a [`Responder`] running on the
//! same tokio runtime, one task per `request_channel`.

use crate::channel::{BoxFuture, Channel, Connector, PayloadStream, SetupParams};
use crate::error::TransportError;
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info};
use wick_core::Payload;

const RESPONSE_BUFFER: usize = 64;
/// Frames queued toward the responder before the caller is throttled.
pub const INBOUND_BUFFER: usize = 64;

/// Component-side half of a local channel.
pub trait Responder: Send + Sync + 'static {
    fn request_response(&self, payload: Payload) -> BoxFuture<'static, Result<Payload, TransportError>>;

    fn request_channel(&self, payloads: BoxStream<'static, Payload>) -> PayloadStream;
}

pub struct LocalChannel {
    responder: Arc<dyn Responder>,
    closed: watch::Sender<bool>,
}

impl LocalChannel {
    pub fn new(responder: Arc<dyn Responder>) -> Self {
        let (closed, _) = watch::channel(false);
        Self { responder, closed }
    }
}

impl Channel for LocalChannel {
    fn request_response(&self, payload: Payload) -> BoxFuture<'_, Result<Payload, TransportError>> {
        let responder = self.responder.clone();
        let mut closed = self.closed.subscribe();

        Box::pin(async move {
            if *closed.borrow() {
                return Err(TransportError::Closed);
            }
            tokio::select! {
                biased;
                _ = closed.changed() => Err(TransportError::Closed),
                result = responder.request_response(payload) => result,
            }
        })
    }

    fn request_channel(&self, payloads: PayloadStream) -> PayloadStream {
        let responder = self.responder.clone();
        let closed = self.closed.subscribe();

        // Nothing is sent until the caller starts pulling.
        let start = async move {
            let (tx, rx) = mpsc::channel(RESPONSE_BUFFER);
            tokio::spawn(drive_request(responder, payloads, tx, closed));
            ReceiverStream::new(rx)
        };
        stream::once(start).flatten().boxed()
    }

    fn close(&self) {
        if !self.closed.send_replace(true) {
            info!("[LocalChannel] closed");
        }
    }

    fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }
}

async fn drive_request(
    responder: Arc<dyn Responder>,
    mut outbound: PayloadStream,
    tx: mpsc::Sender<Result<Payload, TransportError>>,
    mut closed: watch::Receiver<bool>,
) {
    if *closed.borrow() {
        let _ = tx.send(Err(TransportError::Closed)).await;
        return;
    }

    // Bounded so a responder that reads slowly holds the caller's stream back.
    let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_BUFFER);
    let mut responses = responder.request_channel(ReceiverStream::new(inbound_rx).boxed());
    let mut inbound_tx = Some(inbound_tx);
    // Pulled from the caller, waiting for room on the inbound queue.
    let mut pending: Option<Payload> = None;

    loop {
        tokio::select! {
            _ = closed.changed() => {
                let _ = tx.send(Err(TransportError::Closed)).await;
                break;
            }
            _ = tx.closed() => {
                debug!("[LocalChannel] consumer dropped, cancelling request");
                break;
            }
            next = outbound.next(), if inbound_tx.is_some() && pending.is_none() => match next {
                Some(Ok(payload)) => pending = Some(payload),
                Some(Err(e)) => {
                    let _ = tx.send(Err(e)).await;
                    break;
                }
                // Half-close: the responder sees its inbound stream end.
                None => inbound_tx = None,
            },
            permit = reserve_slot(inbound_tx.clone()), if pending.is_some() => match (permit, pending.take()) {
                (Some(permit), Some(payload)) => {
                    permit.send(payload);
                }
                // Responder stopped listening; stop pulling from the caller.
                _ => inbound_tx = None,
            },
            response = responses.next() => match response {
                Some(item) => {
                    if tx.send(item).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
        }
    }
}

async fn reserve_slot(tx: Option<mpsc::Sender<Payload>>) -> Option<mpsc::OwnedPermit<Payload>> {
    tx?.reserve_owned().await.ok()
}

/// Hands out [`LocalChannel`]s backed by a shared responder.
pub struct LocalConnector {
    responder: Arc<dyn Responder>,
}

impl LocalConnector {
    pub fn new(responder: Arc<dyn Responder>) -> Self {
        Self { responder }
    }
}

impl Connector for LocalConnector {
    fn connect(&self, params: SetupParams) -> BoxFuture<'_, Result<Arc<dyn Channel>, TransportError>> {
        Box::pin(async move {
            // Keep-alive and lifetime have nothing to police in-process.
            debug!(
                keep_alive_ms = params.keep_alive.as_millis() as u64,
                lifetime_ms = params.lifetime.as_millis() as u64,
                "[LocalConnector] connecting"
            );
            Ok(Arc::new(LocalChannel::new(self.responder.clone())) as Arc<dyn Channel>)
        })
    }
}
