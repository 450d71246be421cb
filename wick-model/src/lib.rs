// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Leif Rydenfalk – https://github.com/Leif-Rydenfalk/cell

pub mod claims;
pub mod context;
pub mod signature;

pub use claims::{decode_claims, Claims, ClaimsError, Wascap, CLAIMS_SECTION};
pub use context::*;
pub use signature::*;

pub use serde;
pub use serde_json;
