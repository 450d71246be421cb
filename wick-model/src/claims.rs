// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Leif Rydenfalk – https://github.com/Leif-Rydenfalk/cell

//! Claims token embedded in a compiled component.
//!
//! The token is a JWT-shaped string `<header>.<claims>[.<signature>]`. Only
//! the claims segment is read; signature verification is not done here.

use crate::signature::Signature;
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Custom section holding the claims token. A format change gets a new name.
pub const CLAIMS_SECTION: &str = "wick/claims@v1";

#[derive(Debug, Error)]
pub enum ClaimsError {
    #[error("invalid module, no claims found")]
    NoClaims,
    #[error("module has no '{0}' section")]
    MissingSection(&'static str),
    #[error("claims token is not valid UTF-8")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("claims segment is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("claims segment is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Claims {
    #[serde(default)]
    pub jti: String,
    #[serde(default)]
    pub iat: u64,
    #[serde(default)]
    pub iss: String,
    #[serde(default)]
    pub sub: String,
    pub wascap: Wascap,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Wascap {
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub interface: Signature,
}

pub fn decode_claims(section: &[u8]) -> Result<Claims, ClaimsError> {
    let token = std::str::from_utf8(section)?;
    let mut parts = token.trim().split('.');
    let _header = parts.next();
    let claims = match parts.next() {
        Some(claims) if !claims.is_empty() => claims,
        _ => return Err(ClaimsError::NoClaims),
    };

    let raw = decode_segment(claims)?;
    Ok(serde_json::from_slice(&raw)?)
}

// Tokens in the wild use both alphabets, with and without padding.
fn decode_segment(segment: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let segment = segment.trim_end_matches('=');
    URL_SAFE_NO_PAD
        .decode(segment)
        .or_else(|_| STANDARD_NO_PAD.decode(segment))
}
