// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Leif Rydenfalk – https://github.com/Leif-Rydenfalk/cell

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Identifies a component as seen from another one.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ComponentReference {
    pub origin: String,
    pub target: String,
}

/// Call-scoped deterministic inputs.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InherentData {
    pub seed: u64,
    pub timestamp: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InvocationRequest {
    pub reference: ComponentReference,
    pub operation: String,
}

/// Per-invocation context. Rides on the first packet of a call only.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ContextTransport {
    pub config: Option<Value>,
    pub inherent: InherentData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invocation: Option<InvocationRequest>,
}

impl ContextTransport {
    /// A missing per-call config goes out as an empty map.
    pub fn new(config: Option<Value>, inherent: InherentData) -> Self {
        Self {
            config: Some(config.unwrap_or_else(|| Value::Object(Map::new()))),
            inherent,
            invocation: None,
        }
    }

    pub fn with_invocation(mut self, invocation: InvocationRequest) -> Self {
        self.invocation = Some(invocation);
        self
    }
}

/// Body of the one-time setup request sent to a freshly connected component.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SetupPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
    pub provided: Option<HashMap<String, ComponentReference>>,
    pub imported: Option<HashMap<String, ComponentReference>>,
}

impl SetupPayload {
    pub fn new(config: Value) -> Self {
        Self {
            config: Some(config),
            ..Default::default()
        }
    }

    /// Fills absent `provided`/`imported` with empty maps. Components expect
    /// both keys on the wire.
    pub fn normalized(mut self) -> Self {
        self.provided.get_or_insert_with(HashMap::new);
        self.imported.get_or_insert_with(HashMap::new);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalized_setup_has_both_maps() {
        let setup = SetupPayload::new(json!({ "default_err": "test err" })).normalized();
        assert_eq!(setup.provided, Some(HashMap::new()));
        assert_eq!(setup.imported, Some(HashMap::new()));

        let encoded = serde_json::to_value(&setup).unwrap();
        assert_eq!(encoded["provided"], json!({}));
        assert_eq!(encoded["imported"], json!({}));
    }

    #[test]
    fn normalize_keeps_existing_references() {
        let mut provided = HashMap::new();
        provided.insert(
            "math".to_string(),
            ComponentReference {
                origin: "root".into(),
                target: "math".into(),
            },
        );
        let setup = SetupPayload {
            provided: Some(provided.clone()),
            ..Default::default()
        }
        .normalized();
        assert_eq!(setup.provided, Some(provided));
    }

    #[test]
    fn setup_without_config_omits_the_key() {
        let encoded = serde_json::to_value(SetupPayload::default().normalized()).unwrap();
        assert!(encoded.get("config").is_none());
        assert_eq!(encoded["provided"], json!({}));
    }

    #[test]
    fn missing_call_config_defaults_to_empty_map() {
        let ctx = ContextTransport::new(None, InherentData::default());
        assert_eq!(ctx.config, Some(json!({})));

        let given = ContextTransport::new(Some(json!({ "k": 1 })), InherentData::default());
        assert_eq!(given.config, Some(json!({ "k": 1 })));
    }

    #[test]
    fn context_omits_missing_invocation() {
        let ctx = ContextTransport::new(None, InherentData::default());
        let encoded = serde_json::to_value(&ctx).unwrap();
        assert!(encoded.get("invocation").is_none());
        assert_eq!(encoded["inherent"], json!({ "seed": 0, "timestamp": 0 }));
    }
}
