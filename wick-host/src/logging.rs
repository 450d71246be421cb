// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Leif Rydenfalk – https://github.com/Leif-Rydenfalk/cell

use std::env;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Compact,
}

impl LogFormat {
    /// `WICK_LOG_FORMAT=compact` for human-readable output, JSON otherwise.
    pub fn from_env() -> Self {
        match env::var("WICK_LOG_FORMAT").as_deref() {
            Ok("compact") | Ok("pretty") => Self::Compact,
            _ => Self::Json,
        }
    }
}

/// Installs the global subscriber, filtered by `RUST_LOG` (default `info`).
/// Returns false when one was already installed.
pub fn init_logging(host_name: &str, format: LogFormat) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = format == LogFormat::Json;

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().with_target(true).with_thread_ids(true).json()))
        .with((!json).then(|| fmt::layer().with_target(false).compact()))
        .try_init()
        .is_ok();

    if installed {
        info!(
            host = host_name,
            version = env!("CARGO_PKG_VERSION"),
            ?format,
            "wick host logging ready"
        );
    }
    installed
}

/// Logs the outcome of a lifecycle step and hands the result back unchanged.
#[macro_export]
macro_rules! log_operation {
    ($op:expr, $component:expr, $result:expr) => {
        match $result {
            Ok(val) => {
                tracing::debug!(operation = $op, component = %$component, "step ok");
                Ok(val)
            }
            Err(e) => {
                tracing::error!(operation = $op, component = %$component, error = %e, "step failed");
                Err(e)
            }
        }
    };
}
