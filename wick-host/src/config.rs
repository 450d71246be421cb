// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Leif Rydenfalk – https://github.com/Leif-Rydenfalk/cell

use anyhow::{bail, Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use wick_model::InherentData;
use wick_transport::channel::LIFETIME;

/// What to do when a module's claims can't be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClaimsPolicy {
    /// Load anyway with the `unknown` signature and log a warning.
    #[default]
    Lenient,
    /// Refuse to load the module.
    Strict,
}

impl FromStr for ClaimsPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => bail!("unknown claims policy '{}', expected 'strict' or 'lenient'", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HostConfig {
    pub claims_policy: ClaimsPolicy,
    /// Bound on the setup handshake. Hitting it is fatal for the component.
    pub setup_timeout: Duration,
    /// Seed and timestamp handed to invocations that don't bring their own.
    pub inherent: InherentData,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            claims_policy: ClaimsPolicy::default(),
            setup_timeout: LIFETIME,
            inherent: InherentData::default(),
        }
    }
}

impl HostConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let claims_policy = match env::var("WICK_CLAIMS_POLICY") {
            Ok(v) => v.parse().context("WICK_CLAIMS_POLICY")?,
            Err(_) => defaults.claims_policy,
        };

        let setup_timeout = match env::var("WICK_SETUP_TIMEOUT_MS") {
            Ok(v) => Duration::from_millis(
                v.parse::<u64>()
                    .context("WICK_SETUP_TIMEOUT_MS must be a u64 (milliseconds)")?,
            ),
            Err(_) => defaults.setup_timeout,
        };

        let seed = parse_u64("WICK_SEED")?.unwrap_or(defaults.inherent.seed);
        let timestamp = parse_u64("WICK_TIMESTAMP")?.unwrap_or(defaults.inherent.timestamp);

        Ok(Self {
            claims_policy,
            setup_timeout,
            inherent: InherentData { seed, timestamp },
        })
    }

    pub fn strict() -> Self {
        Self {
            claims_policy: ClaimsPolicy::Strict,
            ..Default::default()
        }
    }
}

fn parse_u64(key: &str) -> Result<Option<u64>> {
    match env::var(key) {
        Ok(v) => Ok(Some(
            v.parse::<u64>()
                .with_context(|| format!("{} must be a u64 integer", key))?,
        )),
        Err(_) => Ok(None),
    }
}
