// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Leif Rydenfalk – https://github.com/Leif-Rydenfalk/cell

use crate::config::ClaimsPolicy;
use crate::loader::Module;
use tracing::warn;
use wick_model::{decode_claims, ClaimsError, Signature, CLAIMS_SECTION};

/// Reads the component signature out of the module's claims section.
///
/// Under [`ClaimsPolicy::Lenient`] any failure yields [`Signature::unknown`]
/// and a warning; under [`ClaimsPolicy::Strict`] the error is returned.
pub fn extract_signature(module: &dyn Module, policy: ClaimsPolicy) -> Result<Signature, ClaimsError> {
    match read_signature(module) {
        Ok(signature) => Ok(signature),
        Err(e) if policy == ClaimsPolicy::Lenient => {
            warn!(error = %e, "failed to decode claims, using unknown signature");
            Ok(Signature::unknown())
        }
        Err(e) => Err(e),
    }
}

fn read_signature(module: &dyn Module) -> Result<Signature, ClaimsError> {
    let sections = module.custom_section(CLAIMS_SECTION);
    let section = sections
        .first()
        .ok_or(ClaimsError::MissingSection(CLAIMS_SECTION))?;
    Ok(decode_claims(section)?.wascap.interface)
}
