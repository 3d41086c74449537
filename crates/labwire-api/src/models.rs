// ── Wire types ──
//
// Identifier plus the detail objects returned by the lab, node and
// interface endpoints. Every struct tolerates unknown fields; the
// platform adds fields between releases.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Lab and node state reported once boot has completed.
pub const STATE_STARTED: &str = "STARTED";

// ── Identifier ──────────────────────────────────────────────────────

/// Opaque identifier naming a lab, node, interface or link.
///
/// The platform issues 36-character identifiers. They are never parsed
/// for structure; the width only matters when an endpoint returns several
/// of them concatenated into one string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Width of a single identifier, in characters.
    pub const WIDTH: usize = 36;

    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for Identifier {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ── Labs ────────────────────────────────────────────────────────────

/// `GET /api/v0/labs/{lab}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabDetail {
    #[serde(default)]
    pub id: Option<Identifier>,
    #[serde(default, alias = "lab_title")]
    pub title: Option<String>,
    #[serde(default, alias = "lab_description")]
    pub description: Option<String>,
    #[serde(default = "unknown_state")]
    pub state: String,
    #[serde(default)]
    pub node_count: Option<u32>,
    #[serde(default)]
    pub link_count: Option<u32>,
}

impl LabDetail {
    pub fn is_started(&self) -> bool {
        self.state == STATE_STARTED
    }
}

// ── Nodes ───────────────────────────────────────────────────────────

/// `GET /api/v0/labs/{lab}/nodes/{node}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDetail {
    #[serde(default)]
    pub id: Option<Identifier>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub node_definition: Option<String>,
    #[serde(default = "unknown_state")]
    pub state: String,
}

impl NodeDetail {
    pub fn is_started(&self) -> bool {
        self.state == STATE_STARTED
    }
}

/// Body for `POST /api/v0/labs/{lab}/nodes`.
#[derive(Debug, Clone, Serialize)]
pub struct NewNode {
    pub label: String,
    pub node_definition: String,
    pub x: i32,
    pub y: i32,
    #[serde(skip)]
    pub populate_interfaces: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ram: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_limit: Option<u32>,
    pub parameters: BTreeMap<String, String>,
    pub tags: Vec<String>,
    pub hide_links: bool,
}

impl NewNode {
    pub fn new(label: impl Into<String>, node_definition: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            node_definition: node_definition.into(),
            x: 0,
            y: 0,
            populate_interfaces: true,
            ram: None,
            cpu_limit: None,
            parameters: BTreeMap::new(),
            tags: Vec::new(),
            hide_links: false,
        }
    }
}

/// One entry of `GET /api/v0/node_definitions`.
///
/// Servers return either a list of these or a map keyed by `id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeDefinition {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
}

// ── Interfaces ──────────────────────────────────────────────────────

/// `GET /api/v0/labs/{lab}/interfaces/{interface}`
///
/// Fields are optional because older servers omit `type`, and the
/// difference between "absent" and "present" matters for kind inference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InterfaceDetail {
    #[serde(default)]
    pub id: Option<Identifier>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub slot: Option<serde_json::Value>,
    #[serde(default)]
    pub is_connected: Option<bool>,
    #[serde(default)]
    pub node: Option<Identifier>,
}

fn unknown_state() -> String {
    "UNKNOWN".into()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lab_detail_defaults_state() {
        let lab: LabDetail = serde_json::from_value(json!({ "id": "x" })).unwrap();
        assert_eq!(lab.state, "UNKNOWN");
        assert!(!lab.is_started());
    }

    #[test]
    fn lab_detail_accepts_prefixed_title() {
        let lab: LabDetail =
            serde_json::from_value(json!({ "lab_title": "Core", "state": "STARTED" })).unwrap();
        assert_eq!(lab.title.as_deref(), Some("Core"));
        assert!(lab.is_started());
    }

    #[test]
    fn interface_detail_distinguishes_missing_type() {
        let with_type: InterfaceDetail =
            serde_json::from_value(json!({ "type": "loopback", "slot": 0 })).unwrap();
        assert_eq!(with_type.kind.as_deref(), Some("loopback"));

        let without: InterfaceDetail = serde_json::from_value(json!({ "slot": 2 })).unwrap();
        assert!(without.kind.is_none());
        assert!(without.slot.is_some());
    }

    #[test]
    fn node_definition_tolerates_sparse_entries() {
        let def: NodeDefinition = serde_json::from_value(json!({
            "id": "iosv",
            "type": "router",
            "interfaces": ["GigabitEthernet0/0", "GigabitEthernet0/1"],
            "sim": { "ram": 512 },
        }))
        .unwrap();
        assert_eq!(def.kind.as_deref(), Some("router"));
        assert_eq!(def.interfaces.len(), 2);

        let bare: NodeDefinition = serde_json::from_value(json!({})).unwrap();
        assert!(bare.id.is_empty());
        assert!(bare.description.is_none());
    }

    #[test]
    fn new_node_omits_unset_resources() {
        let body = serde_json::to_value(NewNode::new("r1", "iosv")).unwrap();
        assert!(body.get("ram").is_none());
        assert!(body.get("populate_interfaces").is_none());
        assert_eq!(body["hide_links"], json!(false));
        assert_eq!(body["tags"], json!([]));
    }
}
