// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Leif Rydenfalk – https://github.com/Leif-Rydenfalk/cell

//! Byte storage handed explicitly to whatever needs to read modules.

use bytes::Bytes;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tokio::sync::RwLock;
use wick_transport::BoxFuture;

#[derive(Debug, Error)]
#[error("i/o error on '{path}': {source}")]
pub struct StorageError {
    pub path: String,
    #[source]
    pub source: std::io::Error,
}

pub trait FileSystem: Send + Sync {
    /// `Ok(None)` when nothing is stored at `path`.
    fn read_bytes<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<Option<Bytes>, StorageError>>;

    fn write_bytes<'a>(&'a self, path: &'a str, contents: Bytes) -> BoxFuture<'a, Result<(), StorageError>>;
}

#[derive(Debug, Default)]
pub struct InMemoryFs {
    entries: RwLock<HashMap<String, Bytes>>,
}

impl InMemoryFs {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FileSystem for InMemoryFs {
    fn read_bytes<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<Option<Bytes>, StorageError>> {
        Box::pin(async move { Ok(self.entries.read().await.get(path).cloned()) })
    }

    fn write_bytes<'a>(&'a self, path: &'a str, contents: Bytes) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            self.entries.write().await.insert(path.to_string(), contents);
            Ok(())
        })
    }
}

/// Disk-backed store rooted at a directory.
#[derive(Debug, Clone)]
pub struct LocalFs {
    root: PathBuf,
}

impl LocalFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Joins `path` under the root. Parent segments and drive prefixes are
    /// refused so nothing resolves outside it.
    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let mut resolved = self.root.clone();
        for component in Path::new(path).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::RootDir | Component::CurDir => {}
                Component::ParentDir | Component::Prefix(_) => {
                    return Err(StorageError {
                        path: path.to_string(),
                        source: std::io::Error::new(ErrorKind::InvalidInput, "path escapes the storage root"),
                    })
                }
            }
        }
        Ok(resolved)
    }
}

impl FileSystem for LocalFs {
    fn read_bytes<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<Option<Bytes>, StorageError>> {
        Box::pin(async move {
            match tokio::fs::read(self.resolve(path)?).await {
                Ok(bytes) => Ok(Some(Bytes::from(bytes))),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                Err(source) => Err(StorageError {
                    path: path.to_string(),
                    source,
                }),
            }
        })
    }

    fn write_bytes<'a>(&'a self, path: &'a str, contents: Bytes) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            let target = self.resolve(path)?;
            let io_err = |source| StorageError {
                path: path.to_string(),
                source,
            };
            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
            }
            tokio::fs::write(&target, &contents).await.map_err(io_err)
        })
    }
}
