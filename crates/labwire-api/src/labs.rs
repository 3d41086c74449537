// Lab endpoints
//
// Lab listing, creation, detail, deletion and the start/stop lifecycle
// transitions.

use serde_json::json;
use tracing::debug;

use crate::error::Error;
use crate::models::{Identifier, LabDetail};
use crate::session::{ApiRequest, Session};

pub(crate) fn lab_path(lab: &Identifier) -> String {
    format!("/api/v0/labs/{lab}")
}

impl Session {
    /// List the identifiers of every lab visible to the user.
    ///
    /// `GET /api/v0/labs`
    pub async fn list_labs(&self) -> Result<Vec<Identifier>, Error> {
        debug!("listing labs");
        self.get_identifiers(&ApiRequest::get("/api/v0/labs")).await
    }

    /// Create an empty lab.
    ///
    /// `POST /api/v0/labs` with `{"title": "...", "description": "..."}`
    pub async fn create_lab(&self, title: &str, description: &str) -> Result<Identifier, Error> {
        debug!(title, "creating lab");
        let body = json!({ "title": title, "description": description });
        self.send_for_id(&ApiRequest::post("/api/v0/labs").json(body))
            .await
    }

    /// `GET /api/v0/labs/{lab}`
    pub async fn get_lab(&self, lab: &Identifier) -> Result<LabDetail, Error> {
        self.send_json(&ApiRequest::get(lab_path(lab))).await
    }

    /// `DELETE /api/v0/labs/{lab}`
    ///
    /// The platform refuses to delete a running lab; callers stop it first.
    pub async fn delete_lab(&self, lab: &Identifier) -> Result<(), Error> {
        debug!(%lab, "deleting lab");
        self.send_empty(&ApiRequest::delete(lab_path(lab))).await
    }

    /// `PUT /api/v0/labs/{lab}/start`
    pub async fn start_lab(&self, lab: &Identifier) -> Result<(), Error> {
        debug!(%lab, "starting lab");
        self.send_empty(&ApiRequest::put(format!("{}/start", lab_path(lab))))
            .await
    }

    /// `PUT /api/v0/labs/{lab}/stop`
    pub async fn stop_lab(&self, lab: &Identifier) -> Result<(), Error> {
        debug!(%lab, "stopping lab");
        self.send_empty(&ApiRequest::put(format!("{}/stop", lab_path(lab))))
            .await
    }
}
