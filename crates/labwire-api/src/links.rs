// Link endpoints
//
// `create_link` posts whatever payload it is handed: the endpoint accepts
// more than one body shape, and choosing between them is the caller's job.

use serde_json::Value;
use tracing::debug;

use crate::error::Error;
use crate::labs::lab_path;
use crate::models::Identifier;
use crate::session::{ApiRequest, Session};

impl Session {
    /// `GET /api/v0/labs/{lab}/links`
    pub async fn list_links(&self, lab: &Identifier) -> Result<Vec<Identifier>, Error> {
        self.get_identifiers(&ApiRequest::get(format!("{}/links", lab_path(lab))))
            .await
    }

    /// `POST /api/v0/labs/{lab}/links`; succeeds only if the response
    /// carries the new link's `id`.
    pub async fn create_link(&self, lab: &Identifier, payload: Value) -> Result<Identifier, Error> {
        debug!(%lab, %payload, "creating link");
        self.send_for_id(&ApiRequest::post(format!("{}/links", lab_path(lab))).json(payload))
            .await
    }

    /// `DELETE /api/v0/labs/{lab}/links/{link}`
    pub async fn delete_link(&self, lab: &Identifier, link: &Identifier) -> Result<(), Error> {
        debug!(%lab, %link, "deleting link");
        self.send_empty(&ApiRequest::delete(format!("{}/links/{link}", lab_path(lab))))
            .await
    }
}
