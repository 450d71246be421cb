// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Leif Rydenfalk – https://github.com/Leif-Rydenfalk/cell

use crate::component::{ComponentState, WasmRsComponent};
use crate::error::{ComponentError, InvokeError};
use crate::WICK_NAMESPACE;
use bytes::Bytes;
use futures::future;
use futures::stream::{BoxStream, StreamExt};
use serde_json::Value;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use tracing::debug;
use wick_codec::{Codec, MessagePackCodec};
use wick_core::{ContextPacket, OperationId, Packet, Payload, WireError};
use wick_model::{ContextTransport, InherentData, SetupPayload};
use wick_transport::{Deadline, PayloadStream, TransportError};

const CODEC: MessagePackCodec = MessagePackCodec;

/// Correlation header sent with the setup request.
const SETUP_METADATA: [u8; 8] = [0; 8];

/// Result of an invocation. Ends after the first error.
pub type PacketStream = BoxStream<'static, Result<Packet, InvokeError>>;

/// Anything that can run a named operation over a packet stream.
pub trait Invokable: Send + Sync {
    fn invoke(
        &self,
        operation: &str,
        stream: BoxStream<'static, Packet>,
        config: Option<Value>,
    ) -> Result<PacketStream, InvokeError>;
}

/// A component that has completed its setup handshake.
pub struct ComponentInstance<'a> {
    component: &'a WasmRsComponent,
    setup_response: Payload,
    inherent: InherentData,
}

impl WasmRsComponent {
    /// Runs the one-time setup handshake and moves the handle to `Ready`.
    ///
    /// A failed handshake terminates the handle. There is no retry.
    pub async fn instantiate(&self, setup: SetupPayload) -> Result<ComponentInstance<'_>, ComponentError> {
        match self.state() {
            ComponentState::ChannelOpen => {}
            ComponentState::Terminated => return Err(ComponentError::Terminated),
            actual => {
                return Err(ComponentError::InvalidState {
                    expected: ComponentState::ChannelOpen,
                    actual,
                })
            }
        }

        let body = CODEC.encode(&setup.normalized())?;

        if self.setup_claimed.swap(true, Ordering::AcqRel) {
            return Err(ComponentError::InvalidState {
                expected: ComponentState::ChannelOpen,
                actual: self.state(),
            });
        }

        let request = Payload::new(Some(Bytes::from(body)), Some(Bytes::from_static(&SETUP_METADATA)));
        let deadline = Deadline::new(self.config.setup_timeout);
        let response = crate::log_operation!(
            "setup",
            self.signature().name,
            deadline.execute(self.channel.request_response(request)).await
        );

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                self.terminate();
                return Err(ComponentError::Setup(e));
            }
        };

        self.lifecycle.advance(ComponentState::ChannelOpen, ComponentState::Ready)?;

        Ok(ComponentInstance {
            component: self,
            setup_response: response,
            inherent: self.config.inherent,
        })
    }

    /// Starts an invocation of an exported operation.
    ///
    /// Only a `Ready` handle accepts calls. Unknown operations and closed
    /// channels fail here, before any frame is sent. Everything after that
    /// arrives on the returned stream. Dropping the stream cancels the request.
    pub fn invoke_with(
        &self,
        operation: &str,
        stream: BoxStream<'static, Packet>,
        config: Option<Value>,
        inherent: InherentData,
    ) -> Result<PacketStream, InvokeError> {
        match self.state() {
            ComponentState::Ready => {}
            ComponentState::Terminated => return Err(TransportError::Closed.into()),
            state => return Err(InvokeError::NotReady(state)),
        }

        let id = self
            .instance
            .operations()
            .get_export(WICK_NAMESPACE, operation)
            .map(|op| op.id())
            .ok_or_else(|| InvokeError::UnresolvedOperation(operation.to_string()))?;

        if self.channel.is_closed() {
            return Err(TransportError::Closed.into());
        }

        debug!(operation, index = id.0, "invoking operation");
        let context = ContextTransport::new(config, inherent);
        let failure = EncodeFailure::default();
        let outbound = outbound_payloads(id, context, stream, failure.clone());
        let inbound = self.channel.request_channel(outbound);
        Ok(inbound_packets(inbound, failure))
    }
}

impl Invokable for WasmRsComponent {
    fn invoke(
        &self,
        operation: &str,
        stream: BoxStream<'static, Packet>,
        config: Option<Value>,
    ) -> Result<PacketStream, InvokeError> {
        self.invoke_with(operation, stream, config, self.config.inherent)
    }
}

impl<'a> ComponentInstance<'a> {
    pub fn component(&self) -> &'a WasmRsComponent {
        self.component
    }

    /// What the component answered to the setup request.
    pub fn setup_response(&self) -> &Payload {
        &self.setup_response
    }

    pub fn with_inherent(mut self, inherent: InherentData) -> Self {
        self.inherent = inherent;
        self
    }

    pub fn invoke_with(
        &self,
        operation: &str,
        stream: BoxStream<'static, Packet>,
        config: Option<Value>,
        inherent: InherentData,
    ) -> Result<PacketStream, InvokeError> {
        self.component.invoke_with(operation, stream, config, inherent)
    }
}

impl Invokable for ComponentInstance<'_> {
    fn invoke(
        &self,
        operation: &str,
        stream: BoxStream<'static, Packet>,
        config: Option<Value>,
    ) -> Result<PacketStream, InvokeError> {
        self.component.invoke_with(operation, stream, config, self.inherent)
    }
}

/// Holds the first outbound encoding failure so the caller gets the typed
/// error back instead of the transport's string form.
#[derive(Clone, Default)]
pub(crate) struct EncodeFailure(Arc<Mutex<Option<WireError>>>);

impl EncodeFailure {
    fn record(&self, err: WireError) -> TransportError {
        let message = err.to_string();
        if let Ok(mut slot) = self.0.lock() {
            slot.get_or_insert(err);
        }
        TransportError::Outbound(message)
    }

    fn take(&self) -> Option<WireError> {
        self.0.lock().ok().and_then(|mut slot| slot.take())
    }
}

/// Wire form of an invocation's packets. Index 0 carries the operation id
/// and the context; every later packet goes out plain.
pub(crate) fn outbound_payloads(
    operation: OperationId,
    context: ContextTransport,
    packets: BoxStream<'static, Packet>,
    failure: EncodeFailure,
) -> PayloadStream {
    packets
        .enumerate()
        .map(move |(index, mut packet)| {
            let encoded = if index == 0 {
                ContextPacket::new(operation, packet, context.clone()).into_payload(&CODEC)
            } else {
                packet.context = None;
                packet.into_payload(&CODEC)
            };
            encoded.map_err(|e| failure.record(e))
        })
        .boxed()
}

fn inbound_packets(inbound: PayloadStream, failure: EncodeFailure) -> PacketStream {
    inbound
        .map(move |frame| match frame {
            Ok(payload) => Packet::from_payload(payload, &CODEC).map_err(InvokeError::from),
            Err(TransportError::Outbound(message)) => Err(match failure.take() {
                Some(wire) => InvokeError::from(wire),
                None => TransportError::Outbound(message).into(),
            }),
            Err(e) => Err(e.into()),
        })
        .scan(false, |failed, item| {
            if *failed {
                return future::ready(None);
            }
            *failed = item.is_err();
            future::ready(Some(item))
        })
        .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use serde_json::json;
    use wick_core::WickMetadata;

    fn plain(port: &str, value: u64) -> Packet {
        Packet::encode(port, &value, &CODEC).unwrap()
    }

    #[tokio::test]
    async fn only_the_first_packet_carries_context() {
        let context = ContextTransport::new(Some(json!({ "k": "v" })), InherentData::default());

        // A stray context on a later packet must not reach the wire.
        let mut third = plain("right", 3);
        third.set_context(context.clone());

        let packets = stream::iter(vec![plain("left", 1), plain("right", 2), third]).boxed();
        let payloads: Vec<_> = outbound_payloads(OperationId(5), context.clone(), packets, EncodeFailure::default())
            .collect()
            .await;
        assert_eq!(payloads.len(), 3);

        for (index, payload) in payloads.into_iter().enumerate() {
            let raw = payload.unwrap().metadata.unwrap();
            let md = WickMetadata::decode(&raw).unwrap();
            if index == 0 {
                assert_eq!(WickMetadata::operation_id(&raw), Some(OperationId(5)));
                let ctx: ContextTransport = CODEC.decode(&md.context.unwrap()).unwrap();
                assert_eq!(ctx, context);
            } else {
                assert_eq!(WickMetadata::operation_id(&raw), Some(OperationId(0)));
                assert_eq!(md.context, None);
            }
        }
    }

    #[tokio::test]
    async fn inbound_stream_stops_after_first_error() {
        let ok = plain("output", 1).into_payload(&CODEC).unwrap();
        let frames = stream::iter(vec![
            Ok(ok.clone()),
            Ok(Payload::data(vec![9u8])),
            Ok(ok),
        ])
        .boxed();

        let items: Vec<_> = inbound_packets(frames, EncodeFailure::default()).collect().await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(InvokeError::MissingMetadata)));
    }

    #[tokio::test]
    async fn encoding_failures_keep_their_wire_error() {
        let failure = EncodeFailure::default();
        let oversized = Packet::new("x".repeat(70_000), vec![1u8]);
        let packets = stream::iter(vec![plain("left", 1), oversized]).boxed();
        let context = ContextTransport::new(None, InherentData::default());

        let outbound: Vec<_> = outbound_payloads(OperationId(1), context, packets, failure.clone())
            .collect()
            .await;
        assert!(outbound[0].is_ok());
        let err = outbound.into_iter().nth(1).unwrap().unwrap_err();
        assert!(matches!(err, TransportError::Outbound(_)));

        let items: Vec<_> = inbound_packets(stream::iter(vec![Err(err)]).boxed(), failure)
            .collect()
            .await;
        assert!(matches!(
            items[0],
            Err(InvokeError::Wire(WireError::TooLong { field: "port name", .. }))
        ));
    }
}
