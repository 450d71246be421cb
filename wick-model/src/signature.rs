// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Leif Rydenfalk – https://github.com/Leif-Rydenfalk/cell

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A component's declared capabilities, as embedded in its claims.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Signature {
    pub name: String,
    pub format: i32,
    #[serde(default)]
    pub metadata: SignatureMetadata,
    #[serde(default)]
    pub operations: Vec<OperationSignature>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SignatureMetadata {
    pub version: String,
}

impl Default for SignatureMetadata {
    fn default() -> Self {
        Self {
            version: "unknown".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OperationSignature {
    pub name: String,
    #[serde(default)]
    pub config: Vec<Field>,
    #[serde(default)]
    pub inputs: Vec<Field>,
    #[serde(default)]
    pub outputs: Vec<Field>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    /// Type descriptors are either a bare name ("u64") or a nested object
    /// for compound types, so they stay untyped here.
    #[serde(rename = "type")]
    pub ty: Value,
    #[serde(default)]
    pub required: bool,
}

impl Signature {
    /// Stand-in used when a module's claims can't be read.
    pub fn unknown() -> Self {
        Self {
            name: "unknown".to_string(),
            format: -1,
            metadata: SignatureMetadata::default(),
            operations: Vec::new(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.format == -1 && self.operations.is_empty()
    }

    pub fn operation(&self, name: &str) -> Option<&OperationSignature> {
        self.operations.iter().find(|op| op.name == name)
    }
}

impl OperationSignature {
    pub fn input(&self, port: &str) -> Option<&Field> {
        self.inputs.iter().find(|f| f.name == port)
    }

    pub fn output(&self, port: &str) -> Option<&Field> {
        self.outputs.iter().find(|f| f.name == port)
    }
}
