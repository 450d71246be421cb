// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Leif Rydenfalk – https://github.com/Leif-Rydenfalk/cell

use crate::component::ComponentState;
use crate::loader::LoaderError;
use crate::storage::StorageError;
use thiserror::Error;
use wick_codec::CodecError;
use wick_core::WireError;
use wick_model::ClaimsError;
use wick_transport::TransportError;

#[derive(Debug, Error)]
pub enum ComponentError {
    #[error("module load failed: {0}")]
    Load(#[from] LoaderError),
    #[error("failed to read claims: {0}")]
    Claims(#[from] ClaimsError),
    #[error("failed to open channel: {0}")]
    Connect(TransportError),
    #[error("setup handshake failed: {0}")]
    Setup(TransportError),
    #[error("component is {actual:?}, expected {expected:?}")]
    InvalidState {
        expected: ComponentState,
        actual: ComponentState,
    },
    #[error("component has been terminated")]
    Terminated,
    #[error("no module at '{0}'")]
    NotFound(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("operation '{0}' is not exported by this component")]
    UnresolvedOperation(String),
    #[error("component is {0:?}, invocations need a completed setup")]
    NotReady(ComponentState),
    #[error("payload came in with no metadata")]
    MissingMetadata,
    #[error(transparent)]
    Wire(WireError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl From<WireError> for InvokeError {
    fn from(err: WireError) -> Self {
        match err {
            WireError::MissingMetadata => InvokeError::MissingMetadata,
            other => InvokeError::Wire(other),
        }
    }
}

impl InvokeError {
    pub fn is_closed(&self) -> bool {
        matches!(self, InvokeError::Transport(TransportError::Closed))
    }
}
