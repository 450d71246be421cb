// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Leif Rydenfalk – https://github.com/Leif-Rydenfalk/cell

//! Seams to the module compiler and to whatever opens a channel into a
//! running instance. Sandboxing lives behind these traits.

use bytes::{Bytes, BytesMut};
use futures::stream::BoxStream;
use futures::StreamExt;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use wick_core::OperationId;
use wick_transport::{BoxFuture, Channel, Connector, SetupParams, TransportError};

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("compile failed: {0}")]
    Compile(String),
    #[error("instantiate failed: {0}")]
    Instantiate(String),
    #[error("module source failed: {0}")]
    Source(String),
}

/// Chunks of module bytes arriving over time.
pub type ByteStream = BoxStream<'static, Result<Bytes, LoaderError>>;

pub trait ModuleLoader: Send + Sync {
    fn compile(&self, bytes: Bytes) -> BoxFuture<'_, Result<Arc<dyn Module>, LoaderError>>;

    /// Buffers the source and hands it to `compile`. Loaders that can
    /// compile while downloading override this.
    fn compile_streaming(&self, mut source: ByteStream) -> BoxFuture<'_, Result<Arc<dyn Module>, LoaderError>> {
        Box::pin(async move {
            let mut buf = BytesMut::new();
            while let Some(chunk) = source.next().await {
                buf.extend_from_slice(&chunk?);
            }
            self.compile(buf.freeze()).await
        })
    }
}

pub trait Module: Send + Sync {
    /// Every custom section with this name, in module order.
    fn custom_section(&self, name: &str) -> Vec<Bytes>;

    fn instantiate(&self, options: Option<HostOptions>) -> BoxFuture<'_, Result<Box<dyn Instance>, LoaderError>>;
}

pub trait Instance: Send + Sync {
    fn operations(&self) -> &OperationTable;
}

/// Opens the streaming channel into a compiled module's running instance.
pub trait ModuleTransport: Send + Sync {
    fn connect<'a>(
        &'a self,
        module: &'a dyn Module,
        params: SetupParams,
    ) -> BoxFuture<'a, Result<Arc<dyn Channel>, TransportError>>;
}

// A plain connector doesn't care which module it talks to.
impl<T: Connector> ModuleTransport for T {
    fn connect<'a>(
        &'a self,
        _module: &'a dyn Module,
        params: SetupParams,
    ) -> BoxFuture<'a, Result<Arc<dyn Channel>, TransportError>> {
        Connector::connect(self, params)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    RequestResponse,
    RequestStream,
    RequestChannel,
    FireAndForget,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub index: u32,
    pub kind: OperationKind,
    pub namespace: String,
    pub name: String,
}

impl Operation {
    pub fn new(index: u32, kind: OperationKind, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            index,
            kind,
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn id(&self) -> OperationId {
        OperationId(self.index)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationTable {
    pub exports: Vec<Operation>,
    pub imports: Vec<Operation>,
}

impl OperationTable {
    pub fn get_export(&self, namespace: &str, name: &str) -> Option<&Operation> {
        find(&self.exports, namespace, name)
    }

    pub fn get_import(&self, namespace: &str, name: &str) -> Option<&Operation> {
        find(&self.imports, namespace, name)
    }

    pub fn export_names(&self) -> impl Iterator<Item = &str> {
        self.exports.iter().map(|op| op.name.as_str())
    }
}

fn find<'a>(ops: &'a [Operation], namespace: &str, name: &str) -> Option<&'a Operation> {
    ops.iter().find(|op| op.namespace == namespace && op.name == name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WasiVersion {
    Unstable,
    SnapshotPreview1,
}

/// WASI-style host configuration supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostOptions {
    pub version: Option<WasiVersion>,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub preopens: HashMap<String, PathBuf>,
    pub stdin: Option<u32>,
    pub stdout: Option<u32>,
    pub stderr: Option<u32>,
}

impl HostOptions {
    /// What instantiation is allowed to see: the WASI version and the three
    /// standard descriptors. Args, env and preopens never reach the guest.
    pub fn restricted(&self) -> HostOptions {
        HostOptions {
            version: self.version,
            stdin: self.stdin,
            stdout: self.stdout,
            stderr: self.stderr,
            ..Default::default()
        }
    }
}
