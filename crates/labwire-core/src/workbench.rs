// ── Workbench facade ──
//
// The one object collaborators hold. Owns the shared session and hands out
// short-lived resolvers, negotiators and pollers borrowing it. Lab, node
// and link plumbing that needs no logic of its own is forwarded straight to
// the session with errors mapped into `CoreError`.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use labwire_api::{
    ApiRequest, Identifier, LabDetail, NewNode, NodeDefinition, NodeDetail, Response, Session,
};

use crate::config::ConnectionConfig;
use crate::error::CoreError;
use crate::negotiator::{LinkNegotiator, LinkOutcome, LinkPayload};
use crate::readiness::{DEFAULT_POLL_INTERVAL, Readiness, ReadinessPoller};
use crate::resolver::{InterfaceDescriptor, InterfaceResolver};

/// Entry point for everything above the core.
///
/// Cheap to clone; clones share one [`Session`] and therefore one token.
#[derive(Debug, Clone)]
pub struct Workbench {
    session: Arc<Session>,
    poll_interval: Duration,
    link_order: Vec<LinkPayload>,
}

impl Workbench {
    /// Build a workbench from configuration. Does not touch the network;
    /// the first call authenticates lazily, or call [`connect`](Self::connect).
    pub fn new(config: &ConnectionConfig) -> Result<Self, CoreError> {
        let session = Session::new(
            config.url.clone(),
            config.credentials(),
            &config.transport(),
        )?;
        Ok(Self {
            session: Arc::new(session),
            poll_interval: config.poll_interval,
            link_order: config.link_order.clone(),
        })
    }

    /// Wrap an existing session (shared with other collaborators).
    pub fn from_session(session: Arc<Session>) -> Self {
        Self {
            session,
            poll_interval: DEFAULT_POLL_INTERVAL,
            link_order: LinkPayload::preference(),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_link_order(mut self, order: Vec<LinkPayload>) -> Self {
        self.link_order = order;
        self
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Authenticate eagerly so bad credentials surface before any work.
    pub async fn connect(&self) -> Result<(), CoreError> {
        self.session.authenticate().await?;
        info!(url = %self.session.base_url(), user = self.session.username(), "connected");
        Ok(())
    }

    pub fn resolver(&self) -> InterfaceResolver<'_> {
        InterfaceResolver::new(&self.session)
    }

    pub fn negotiator(&self) -> LinkNegotiator<'_> {
        LinkNegotiator::new(&self.session).with_order(self.link_order.clone())
    }

    pub fn poller(&self) -> ReadinessPoller<'_> {
        ReadinessPoller::new(&self.session).with_interval(self.poll_interval)
    }

    // ── Raw access ───────────────────────────────────────────────────

    /// Authenticated request against any endpoint.
    pub async fn request(&self, req: &ApiRequest) -> Result<Response, CoreError> {
        Ok(self.session.send(req).await?)
    }

    /// Authenticated GET of an identifier-list endpoint, normalized.
    pub async fn list_identifiers(&self, req: &ApiRequest) -> Result<Vec<Identifier>, CoreError> {
        Ok(self.session.get_identifiers(req).await?)
    }

    // ── Labs ─────────────────────────────────────────────────────────

    pub async fn list_labs(&self) -> Result<Vec<Identifier>, CoreError> {
        Ok(self.session.list_labs().await?)
    }

    pub async fn create_lab(&self, title: &str, description: &str) -> Result<Identifier, CoreError> {
        let lab = self.session.create_lab(title, description).await?;
        info!(%lab, title, "lab created");
        Ok(lab)
    }

    pub async fn get_lab(&self, lab: &Identifier) -> Result<LabDetail, CoreError> {
        Ok(self.session.get_lab(lab).await?)
    }

    /// Delete a lab, stopping it first if it is running.
    pub async fn delete_lab(&self, lab: &Identifier) -> Result<(), CoreError> {
        let detail = self.session.get_lab(lab).await?;
        if detail.is_started() {
            debug!(%lab, "stopping lab before delete");
            self.session.stop_lab(lab).await?;
        }
        self.session.delete_lab(lab).await?;
        info!(%lab, "lab deleted");
        Ok(())
    }

    pub async fn start_lab(&self, lab: &Identifier) -> Result<(), CoreError> {
        Ok(self.session.start_lab(lab).await?)
    }

    pub async fn stop_lab(&self, lab: &Identifier) -> Result<(), CoreError> {
        Ok(self.session.stop_lab(lab).await?)
    }

    pub async fn wait_until_ready(
        &self,
        lab: &Identifier,
        timeout: Duration,
    ) -> Result<Readiness, CoreError> {
        self.poller().wait_until_ready(lab, timeout).await
    }

    // ── Nodes ────────────────────────────────────────────────────────

    /// Node definitions accepted by [`add_node`](Self::add_node).
    pub async fn list_node_definitions(&self) -> Result<Vec<NodeDefinition>, CoreError> {
        Ok(self.session.list_node_definitions().await?)
    }

    pub async fn list_nodes(&self, lab: &Identifier) -> Result<Vec<Identifier>, CoreError> {
        Ok(self.session.list_nodes(lab).await?)
    }

    pub async fn get_node(&self, lab: &Identifier, node: &Identifier) -> Result<NodeDetail, CoreError> {
        Ok(self.session.get_node(lab, node).await?)
    }

    pub async fn add_node(&self, lab: &Identifier, node: &NewNode) -> Result<Identifier, CoreError> {
        let id = self.session.add_node(lab, node).await?;
        info!(%lab, node = %id, label = %node.label, "node added");
        Ok(id)
    }

    pub async fn get_node_config(
        &self,
        lab: &Identifier,
        node: &Identifier,
    ) -> Result<String, CoreError> {
        Ok(self.session.get_node_config(lab, node).await?)
    }

    pub async fn set_node_config(
        &self,
        lab: &Identifier,
        node: &Identifier,
        config: &str,
    ) -> Result<(), CoreError> {
        Ok(self.session.set_node_config(lab, node, config).await?)
    }

    // ── Interfaces ───────────────────────────────────────────────────

    pub async fn list_interfaces(
        &self,
        lab: &Identifier,
        node: &Identifier,
    ) -> Result<Vec<Identifier>, CoreError> {
        self.resolver().list_interfaces(lab, node).await
    }

    pub async fn describe_interface(
        &self,
        lab: &Identifier,
        interface: &Identifier,
    ) -> Result<InterfaceDescriptor, CoreError> {
        self.resolver().describe_interface(lab, interface).await
    }

    pub async fn find_available_physical(
        &self,
        lab: &Identifier,
        node: &Identifier,
    ) -> Result<Option<InterfaceDescriptor>, CoreError> {
        self.resolver().find_available_physical(lab, node).await
    }

    pub async fn list_physical(
        &self,
        lab: &Identifier,
        node: &Identifier,
    ) -> Result<Vec<InterfaceDescriptor>, CoreError> {
        self.resolver().list_physical(lab, node).await
    }

    /// Add an interface in `slot`. Refused while the lab is running.
    pub async fn create_interface(
        &self,
        lab: &Identifier,
        node: &Identifier,
        slot: u32,
    ) -> Result<Identifier, CoreError> {
        let detail = self.session.get_lab(lab).await?;
        if detail.is_started() {
            return Err(CoreError::Rejected {
                message: format!("lab {lab} is started; stop it before adding interfaces"),
            });
        }
        Ok(self.session.create_interface(lab, node, slot).await?)
    }

    // ── Links ────────────────────────────────────────────────────────

    pub async fn list_links(&self, lab: &Identifier) -> Result<Vec<Identifier>, CoreError> {
        Ok(self.session.list_links(lab).await?)
    }

    pub async fn link_interfaces(
        &self,
        lab: &Identifier,
        interface_a: &Identifier,
        interface_b: &Identifier,
    ) -> Result<LinkOutcome, CoreError> {
        self.negotiator()
            .link_interfaces(lab, interface_a, interface_b)
            .await
    }

    pub async fn link_nodes(
        &self,
        lab: &Identifier,
        node_a: &Identifier,
        node_b: &Identifier,
    ) -> Result<LinkOutcome, CoreError> {
        self.negotiator().link_nodes(lab, node_a, node_b).await
    }

    pub async fn delete_link(&self, lab: &Identifier, link: &Identifier) -> Result<(), CoreError> {
        Ok(self.session.delete_link(lab, link).await?)
    }
}
