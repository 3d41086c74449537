// Node endpoints
//
// Node listing and detail (polled for readiness), node creation, the
// startup-configuration text and the catalogue of node definitions.

use serde_json::Value;
use tracing::debug;

use crate::error::Error;
use crate::labs::lab_path;
use crate::models::{Identifier, NewNode, NodeDefinition, NodeDetail};
use crate::normalize::kind_name;
use crate::session::{ApiRequest, Session};

const NODE_DEFINITIONS_PATH: &str = "/api/v0/node_definitions";

fn node_path(lab: &Identifier, node: &Identifier) -> String {
    format!("{}/nodes/{node}", lab_path(lab))
}

impl Session {
    /// `GET /api/v0/labs/{lab}/nodes`
    pub async fn list_nodes(&self, lab: &Identifier) -> Result<Vec<Identifier>, Error> {
        self.get_identifiers(&ApiRequest::get(format!("{}/nodes", lab_path(lab))))
            .await
    }

    /// `GET /api/v0/labs/{lab}/nodes/{node}`
    pub async fn get_node(&self, lab: &Identifier, node: &Identifier) -> Result<NodeDetail, Error> {
        self.send_json(&ApiRequest::get(node_path(lab, node))).await
    }

    /// Add a node to a lab.
    ///
    /// `POST /api/v0/labs/{lab}/nodes[?populate_interfaces=true]`
    pub async fn add_node(&self, lab: &Identifier, node: &NewNode) -> Result<Identifier, Error> {
        debug!(%lab, label = %node.label, definition = %node.node_definition, "adding node");
        let body = serde_json::to_value(node).map_err(|e| Error::Deserialization {
            message: format!("failed to encode node: {e}"),
            body: String::new(),
        })?;
        let mut req = ApiRequest::post(format!("{}/nodes", lab_path(lab))).json(body);
        if node.populate_interfaces {
            req = req.query("populate_interfaces", true);
        }
        self.send_for_id(&req).await
    }

    /// `GET /api/v0/labs/{lab}/nodes/{node}/config`, returned verbatim.
    pub async fn get_node_config(
        &self,
        lab: &Identifier,
        node: &Identifier,
    ) -> Result<String, Error> {
        self.send_text(&ApiRequest::get(format!("{}/config", node_path(lab, node))))
            .await
    }

    /// Replace a node's startup configuration.
    ///
    /// `PUT /api/v0/labs/{lab}/nodes/{node}/config` with the raw text as body.
    pub async fn set_node_config(
        &self,
        lab: &Identifier,
        node: &Identifier,
        config: &str,
    ) -> Result<(), Error> {
        debug!(%lab, %node, bytes = config.len(), "pushing node config");
        let req = ApiRequest::put(format!("{}/config", node_path(lab, node))).text(config);
        self.send_empty(&req).await
    }

    /// Node definitions the server can instantiate.
    ///
    /// `GET /api/v0/node_definitions`. A map response is keyed by id; the
    /// key fills in `id` when the entry itself omits it.
    pub async fn list_node_definitions(&self) -> Result<Vec<NodeDefinition>, Error> {
        let value: Value = self.send_json(&ApiRequest::get(NODE_DEFINITIONS_PATH)).await?;
        match value {
            Value::Array(items) => items.into_iter().map(node_definition).collect(),
            Value::Object(map) => map
                .into_iter()
                .map(|(key, item)| {
                    let mut def = node_definition(item)?;
                    if def.id.is_empty() {
                        def.id = key;
                    }
                    Ok(def)
                })
                .collect(),
            other => Err(Error::UnexpectedShape {
                endpoint: NODE_DEFINITIONS_PATH.into(),
                shape: kind_name(&other).into(),
            }),
        }
    }
}

fn node_definition(item: Value) -> Result<NodeDefinition, Error> {
    serde_json::from_value(item).map_err(|e| Error::Deserialization {
        message: format!("invalid node definition: {e}"),
        body: String::new(),
    })
}
