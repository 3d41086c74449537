// Interface endpoints

use serde_json::json;
use tracing::debug;

use crate::error::Error;
use crate::labs::lab_path;
use crate::models::{Identifier, InterfaceDetail};
use crate::session::{ApiRequest, Session};

impl Session {
    /// List a node's interface identifiers.
    ///
    /// `GET /api/v0/labs/{lab}/nodes/{node}/interfaces[?operational=true]`
    pub async fn list_interfaces(
        &self,
        lab: &Identifier,
        node: &Identifier,
        operational: bool,
    ) -> Result<Vec<Identifier>, Error> {
        let mut req = ApiRequest::get(format!("{}/nodes/{node}/interfaces", lab_path(lab)));
        if operational {
            req = req.query("operational", true);
        }
        self.get_identifiers(&req).await
    }

    /// `GET /api/v0/labs/{lab}/interfaces/{interface}[?operational=true]`
    pub async fn get_interface(
        &self,
        lab: &Identifier,
        interface: &Identifier,
        operational: bool,
    ) -> Result<InterfaceDetail, Error> {
        let mut req = ApiRequest::get(format!("{}/interfaces/{interface}", lab_path(lab)));
        if operational {
            req = req.query("operational", true);
        }
        self.send_json(&req).await
    }

    /// Create an interface in the given slot of a node.
    ///
    /// `POST /api/v0/labs/{lab}/interfaces` with `{"node": "...", "slot": N}`
    pub async fn create_interface(
        &self,
        lab: &Identifier,
        node: &Identifier,
        slot: u32,
    ) -> Result<Identifier, Error> {
        debug!(%lab, %node, slot, "creating interface");
        let body = json!({ "node": node, "slot": slot });
        self.send_for_id(&ApiRequest::post(format!("{}/interfaces", lab_path(lab))).json(body))
            .await
    }
}
