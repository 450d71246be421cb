// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Leif Rydenfalk – https://github.com/Leif-Rydenfalk/cell

//! Component handle: compiled module, running instance and the channel into
//! it, plus the lifecycle that ties them together.

use crate::claims::extract_signature;
use crate::config::HostConfig;
use crate::error::ComponentError;
use crate::loader::{ByteStream, HostOptions, Instance, LoaderError, Module, ModuleLoader, ModuleTransport, OperationTable};
use crate::storage::FileSystem;
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};
use wick_model::Signature;
use wick_transport::{Channel, SetupParams};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ComponentState {
    Loading = 0,
    SignatureExtracted = 1,
    Instantiated = 2,
    ChannelOpen = 3,
    Ready = 4,
    Terminated = 5,
}

impl ComponentState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Loading,
            1 => Self::SignatureExtracted,
            2 => Self::Instantiated,
            3 => Self::ChannelOpen,
            4 => Self::Ready,
            _ => Self::Terminated,
        }
    }
}

pub(crate) struct Lifecycle {
    state: AtomicU8,
}

impl Lifecycle {
    fn new() -> Self {
        Self {
            state: AtomicU8::new(ComponentState::Loading as u8),
        }
    }

    pub(crate) fn get(&self) -> ComponentState {
        ComponentState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Moves `from -> to`, or reports the state the handle is actually in.
    pub(crate) fn advance(&self, from: ComponentState, to: ComponentState) -> Result<(), ComponentError> {
        match self
            .state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => {
                info!(from = ?from, to = ?to, "component state changed");
                Ok(())
            }
            Err(raw) => match ComponentState::from_u8(raw) {
                ComponentState::Terminated => Err(ComponentError::Terminated),
                actual => Err(ComponentError::InvalidState { expected: from, actual }),
            },
        }
    }

    /// Returns the state held before termination.
    fn terminate(&self) -> ComponentState {
        ComponentState::from_u8(self.state.swap(ComponentState::Terminated as u8, Ordering::AcqRel))
    }
}

/// Collaborators and settings used to load a component.
#[derive(Clone)]
pub struct ComponentOptions {
    pub loader: Arc<dyn ModuleLoader>,
    pub transport: Arc<dyn ModuleTransport>,
    /// Caller's host options. Only a restricted view reaches the module.
    pub host: Option<HostOptions>,
    pub config: HostConfig,
}

impl ComponentOptions {
    pub fn new(loader: Arc<dyn ModuleLoader>, transport: Arc<dyn ModuleTransport>) -> Self {
        Self {
            loader,
            transport,
            host: None,
            config: HostConfig::default(),
        }
    }

    pub fn with_host(mut self, host: HostOptions) -> Self {
        self.host = Some(host);
        self
    }

    pub fn with_config(mut self, config: HostConfig) -> Self {
        self.config = config;
        self
    }
}

pub struct WasmRsComponent {
    signature: Signature,
    // Held for the lifetime of the instance.
    _module: Arc<dyn Module>,
    pub(crate) instance: Box<dyn Instance>,
    pub(crate) channel: Arc<dyn Channel>,
    fingerprint: blake3::Hash,
    pub(crate) lifecycle: Lifecycle,
    pub(crate) setup_claimed: AtomicBool,
    pub(crate) config: HostConfig,
}

impl WasmRsComponent {
    pub async fn from_bytes(bytes: impl Into<Bytes>, options: ComponentOptions) -> Result<Self, ComponentError> {
        let bytes = bytes.into();
        let fingerprint = blake3::hash(&bytes);
        debug!(len = bytes.len(), "compiling module");
        let module = options.loader.compile(bytes).await?;
        Self::finish(module, fingerprint, options).await
    }

    /// Compiles while the bytes arrive. Ends up in the same state as
    /// [`WasmRsComponent::from_bytes`] given the same bytes.
    pub async fn from_stream(source: ByteStream, options: ComponentOptions) -> Result<Self, ComponentError> {
        let hasher = Arc::new(Mutex::new(blake3::Hasher::new()));
        let tap = hasher.clone();
        let source = source
            .inspect_ok(move |chunk| {
                if let Ok(mut h) = tap.lock() {
                    h.update(chunk);
                }
            })
            .boxed();

        let module = options.loader.compile_streaming(source).await?;
        let fingerprint = hasher
            .lock()
            .map(|h| h.finalize())
            .map_err(|_| LoaderError::Source("module hasher poisoned".to_string()))?;
        Self::finish(module, fingerprint, options).await
    }

    pub async fn from_fs(fs: &dyn FileSystem, path: &str, options: ComponentOptions) -> Result<Self, ComponentError> {
        let bytes = fs
            .read_bytes(path)
            .await?
            .ok_or_else(|| ComponentError::NotFound(path.to_string()))?;
        Self::from_bytes(bytes, options).await
    }

    async fn finish(
        module: Arc<dyn Module>,
        fingerprint: blake3::Hash,
        options: ComponentOptions,
    ) -> Result<Self, ComponentError> {
        let lifecycle = Lifecycle::new();
        info!(fingerprint = %fingerprint, "module compiled");

        let signature = extract_signature(&*module, options.config.claims_policy)?;
        lifecycle.advance(ComponentState::Loading, ComponentState::SignatureExtracted)?;

        let restricted = options.host.as_ref().map(HostOptions::restricted);
        let instance = module.instantiate(restricted).await?;
        lifecycle.advance(ComponentState::SignatureExtracted, ComponentState::Instantiated)?;

        let channel = options
            .transport
            .connect(&*module, SetupParams::default())
            .await
            .map_err(ComponentError::Connect)?;
        lifecycle.advance(ComponentState::Instantiated, ComponentState::ChannelOpen)?;

        info!(
            component = %signature.name,
            operations = instance.operations().exports.len(),
            "component loaded"
        );

        Ok(Self {
            signature,
            _module: module,
            instance,
            channel,
            fingerprint,
            lifecycle,
            setup_claimed: AtomicBool::new(false),
            config: options.config,
        })
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Exported and imported operations of the running instance.
    pub fn operations(&self) -> &OperationTable {
        self.instance.operations()
    }

    pub fn channel(&self) -> &Arc<dyn Channel> {
        &self.channel
    }

    pub fn state(&self) -> ComponentState {
        self.lifecycle.get()
    }

    /// blake3 digest of the module bytes this handle was loaded from.
    pub fn fingerprint(&self) -> blake3::Hash {
        self.fingerprint
    }

    /// Closes the channel. Safe to call repeatedly and while invocations are
    /// in flight; those fail with a closed-transport error.
    pub fn terminate(&self) {
        let previous = self.lifecycle.terminate();
        self.channel.close();
        if previous != ComponentState::Terminated {
            info!(component = %self.signature.name, from = ?previous, "component terminated");
        }
    }
}
