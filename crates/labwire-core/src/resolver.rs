// ── Interface resolution ──
//
// Enumerates a node's interfaces, fetches per-interface detail, and picks
// the first physical interface that is not yet wired to a link.

use serde::Serialize;
use strum::Display;
use tracing::{debug, trace};

use labwire_api::{Identifier, InterfaceDetail, Session};

use crate::error::CoreError;

/// Whether an interface can carry a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InterfaceKind {
    Physical,
    /// Loopbacks and anything else the platform does not call physical.
    Other,
}

impl InterfaceKind {
    /// Infer the kind from an interface detail object.
    ///
    /// An explicit `type` field is trusted. Servers that omit it still
    /// report a `slot` for physical ports, so a slot counts as physical.
    pub fn infer(detail: &InterfaceDetail) -> Self {
        match detail.kind.as_deref() {
            Some(kind) if kind.eq_ignore_ascii_case("physical") => Self::Physical,
            Some(_) => Self::Other,
            None if detail.slot.is_some() => Self::Physical,
            None => Self::Other,
        }
    }
}

/// What the resolver knows about one interface. Built per lookup, never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceDescriptor {
    pub id: Identifier,
    pub label: Option<String>,
    pub kind: InterfaceKind,
    /// `true` unless the platform reported `is_connected: false`.
    pub connected: bool,
}

impl InterfaceDescriptor {
    pub fn from_detail(id: Identifier, detail: &InterfaceDetail) -> Self {
        Self {
            id,
            label: detail.label.clone(),
            kind: InterfaceKind::infer(detail),
            connected: detail.is_connected.unwrap_or(true),
        }
    }

    /// Physical and free: the only interfaces offered for new links.
    pub fn is_available_physical(&self) -> bool {
        self.kind == InterfaceKind::Physical && !self.connected
    }
}

/// Looks up interfaces through a shared [`Session`].
#[derive(Debug, Clone, Copy)]
pub struct InterfaceResolver<'a> {
    session: &'a Session,
    operational: bool,
}

impl<'a> InterfaceResolver<'a> {
    /// Queries use `?operational=true`, which makes the server include
    /// live connection state in interface details.
    pub fn new(session: &'a Session) -> Self {
        Self {
            session,
            operational: true,
        }
    }

    pub fn operational(mut self, operational: bool) -> Self {
        self.operational = operational;
        self
    }

    /// A node's interface identifiers, in the order the server lists them.
    pub async fn list_interfaces(
        &self,
        lab: &Identifier,
        node: &Identifier,
    ) -> Result<Vec<Identifier>, CoreError> {
        Ok(self
            .session
            .list_interfaces(lab, node, self.operational)
            .await?)
    }

    pub async fn describe_interface(
        &self,
        lab: &Identifier,
        interface: &Identifier,
    ) -> Result<InterfaceDescriptor, CoreError> {
        let detail = self
            .session
            .get_interface(lab, interface, self.operational)
            .await?;
        let descriptor = InterfaceDescriptor::from_detail(interface.clone(), &detail);
        trace!(?descriptor, "described interface");
        Ok(descriptor)
    }

    /// First physical, unconnected interface on `node`, or `None`.
    ///
    /// Interfaces are described one at a time and the search stops at the
    /// first match, so no detail is fetched past it.
    pub async fn find_available_physical(
        &self,
        lab: &Identifier,
        node: &Identifier,
    ) -> Result<Option<InterfaceDescriptor>, CoreError> {
        self.find_available_physical_excluding(lab, node, &[]).await
    }

    /// Like [`find_available_physical`](Self::find_available_physical), but
    /// skips the given interfaces without fetching them. Used when both
    /// ends of a link sit on the same node.
    pub async fn find_available_physical_excluding(
        &self,
        lab: &Identifier,
        node: &Identifier,
        exclude: &[Identifier],
    ) -> Result<Option<InterfaceDescriptor>, CoreError> {
        let ids = self.list_interfaces(lab, node).await?;
        debug!(%lab, %node, count = ids.len(), "searching for a free physical interface");

        for id in ids.iter().filter(|id| !exclude.contains(id)) {
            let descriptor = self.describe_interface(lab, id).await?;
            if descriptor.is_available_physical() {
                debug!(%node, interface = %descriptor.id, "found free physical interface");
                return Ok(Some(descriptor));
            }
        }

        debug!(%node, "no free physical interface");
        Ok(None)
    }

    /// Every physical interface on `node`, connected or not.
    pub async fn list_physical(
        &self,
        lab: &Identifier,
        node: &Identifier,
    ) -> Result<Vec<InterfaceDescriptor>, CoreError> {
        let mut physical = Vec::new();
        for id in self.list_interfaces(lab, node).await? {
            let descriptor = self.describe_interface(lab, &id).await?;
            if descriptor.kind == InterfaceKind::Physical {
                physical.push(descriptor);
            }
        }
        Ok(physical)
    }
}
