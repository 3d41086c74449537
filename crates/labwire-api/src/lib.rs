// labwire-api: Async client for network-emulation lab platforms.
//
// Token session with single-retry re-authentication, identifier-list
// normalization, and thin wrappers over the lab, node, interface and link
// endpoints.

pub mod error;
pub mod interfaces;
pub mod labs;
pub mod links;
pub mod models;
pub mod nodes;
pub mod normalize;
pub mod session;
pub mod transport;

pub use error::Error;
pub use models::{
    Identifier, InterfaceDetail, LabDetail, NewNode, NodeDefinition, NodeDetail, STATE_STARTED,
};
pub use normalize::{IdentifierList, ListEncoding, ShapeError};
pub use reqwest::{Method, Response, StatusCode};
pub use session::{ApiRequest, Credentials, RequestBody, Session};
pub use transport::{TlsMode, TransportConfig};
