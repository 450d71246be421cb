// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Leif Rydenfalk – https://github.com/Leif-Rydenfalk/cell

pub mod channel;
pub mod deadline;
pub mod error;
pub mod local;

pub use channel::{BoxFuture, Channel, Connector, PayloadStream, SetupParams};
pub use deadline::Deadline;
pub use error::TransportError;
pub use local::{LocalChannel, LocalConnector, Responder, INBOUND_BUFFER};
