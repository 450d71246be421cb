// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Leif Rydenfalk – https://github.com/Leif-Rydenfalk/cell

pub mod claims;
pub mod component;
pub mod config;
pub mod error;
pub mod instance;
pub mod loader;
pub mod logging;
pub mod storage;

pub use component::{ComponentOptions, ComponentState, WasmRsComponent};
pub use config::{ClaimsPolicy, HostConfig};
pub use error::{ComponentError, InvokeError};
pub use instance::{ComponentInstance, Invokable, PacketStream};
pub use loader::{
    ByteStream, HostOptions, Instance, LoaderError, Module, ModuleLoader, ModuleTransport,
    Operation, OperationKind, OperationTable, WasiVersion,
};
pub use logging::{init_logging, LogFormat};
pub use storage::{FileSystem, InMemoryFs, LocalFs, StorageError};

pub use wick_core::{flags, Packet};
pub use wick_model::{ComponentReference, InherentData, SetupPayload, Signature};

/// Namespace operations are exported under.
pub const WICK_NAMESPACE: &str = "wick";
