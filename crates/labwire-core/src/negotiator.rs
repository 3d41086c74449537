// ── Link negotiation ──
//
// The link endpoint accepts more than one body shape depending on the
// server build, and there is no way to ask which. Variants are tried in
// a fixed preference order and the first response carrying a link id wins.

use serde::Serialize;
use serde_json::{Map, Value};
use strum::{Display, EnumIter, IntoEnumIterator};
use tracing::{debug, info, warn};

use labwire_api::{Identifier, Session};

use crate::error::CoreError;
use crate::resolver::InterfaceResolver;

/// A body shape accepted by `POST /api/v0/labs/{lab}/links`.
///
/// Declaration order is the default preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkPayload {
    /// `{"i1": a, "i2": b}`
    #[strum(serialize = "i1/i2")]
    InterfacePair,
    /// `{"src_int": a, "dst_int": b}`
    #[strum(serialize = "src_int/dst_int")]
    SourceDestination,
}

impl LinkPayload {
    /// Default preference order.
    pub fn preference() -> Vec<Self> {
        Self::iter().collect()
    }

    pub fn field_names(self) -> (&'static str, &'static str) {
        match self {
            Self::InterfacePair => ("i1", "i2"),
            Self::SourceDestination => ("src_int", "dst_int"),
        }
    }

    pub fn body(self, a: &Identifier, b: &Identifier) -> Value {
        let (first, second) = self.field_names();
        let mut body = Map::new();
        body.insert(first.into(), Value::String(a.to_string()));
        body.insert(second.into(), Value::String(b.to_string()));
        Value::Object(body)
    }
}

/// One rejected variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantAttempt {
    pub variant: LinkPayload,
    pub status: Option<u16>,
    pub error: String,
}

/// A created link plus the variants that were rejected on the way.
#[derive(Debug, Clone, Serialize)]
pub struct LinkOutcome {
    pub link: Identifier,
    pub lab: Identifier,
    pub interface_a: Identifier,
    pub interface_b: Identifier,
    pub variant: LinkPayload,
    pub failed_attempts: Vec<VariantAttempt>,
}

/// Creates links between interfaces, or between nodes by first resolving
/// a free physical interface on each.
#[derive(Debug, Clone)]
pub struct LinkNegotiator<'a> {
    session: &'a Session,
    resolver: InterfaceResolver<'a>,
    order: Vec<LinkPayload>,
}

impl<'a> LinkNegotiator<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self {
            session,
            resolver: InterfaceResolver::new(session),
            order: LinkPayload::preference(),
        }
    }

    /// Override the preference order (e.g. when the server build is known).
    /// An empty order falls back to [`LinkPayload::preference`].
    pub fn with_order(mut self, order: Vec<LinkPayload>) -> Self {
        self.order = if order.is_empty() {
            LinkPayload::preference()
        } else {
            order
        };
        self
    }

    pub fn with_resolver(mut self, resolver: InterfaceResolver<'a>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn order(&self) -> &[LinkPayload] {
        &self.order
    }

    /// Link two interfaces.
    ///
    /// Variants are attempted strictly in order. A rejected variant, a
    /// response without an id or a transport error is recorded and the
    /// next variant tried. Authentication failures abort immediately since
    /// no payload shape can fix them.
    pub async fn link_interfaces(
        &self,
        lab: &Identifier,
        interface_a: &Identifier,
        interface_b: &Identifier,
    ) -> Result<LinkOutcome, CoreError> {
        let mut failed = Vec::new();

        for &variant in &self.order {
            debug!(%lab, %variant, "attempting link creation");
            match self
                .session
                .create_link(lab, variant.body(interface_a, interface_b))
                .await
            {
                Ok(link) => {
                    info!(%lab, %link, %variant, "link created");
                    return Ok(LinkOutcome {
                        link,
                        lab: lab.clone(),
                        interface_a: interface_a.clone(),
                        interface_b: interface_b.clone(),
                        variant,
                        failed_attempts: failed,
                    });
                }
                Err(e) if e.is_auth_failure() => return Err(e.into()),
                Err(e) => {
                    warn!(%lab, %variant, error = %e, "link payload variant rejected");
                    failed.push(VariantAttempt {
                        variant,
                        status: e.status(),
                        error: e.to_string(),
                    });
                }
            }
        }

        Err(CoreError::LinkVariantsExhausted {
            lab: lab.clone(),
            attempts: failed,
        })
    }

    /// Link two nodes through one free physical interface on each.
    ///
    /// Fails with [`CoreError::NoAvailableInterface`] before any link
    /// creation is attempted if either node has nothing free.
    pub async fn link_nodes(
        &self,
        lab: &Identifier,
        node_a: &Identifier,
        node_b: &Identifier,
    ) -> Result<LinkOutcome, CoreError> {
        let a = self
            .resolver
            .find_available_physical(lab, node_a)
            .await?
            .ok_or_else(|| CoreError::NoAvailableInterface {
                lab: lab.clone(),
                node: node_a.clone(),
            })?;

        let exclude = if node_a == node_b {
            vec![a.id.clone()]
        } else {
            Vec::new()
        };
        let b = self
            .resolver
            .find_available_physical_excluding(lab, node_b, &exclude)
            .await?
            .ok_or_else(|| CoreError::NoAvailableInterface {
                lab: lab.clone(),
                node: node_b.clone(),
            })?;

        debug!(%node_a, %node_b, a = %a.id, b = %b.id, "resolved link endpoints");
        self.link_interfaces(lab, &a.id, &b.id).await
    }
}
