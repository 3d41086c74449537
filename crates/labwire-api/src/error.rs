use thiserror::Error;

/// Top-level error type for the `labwire-api` crate.
///
/// Covers every failure mode of the session layer: authentication,
/// transport, non-2xx responses and response bodies that match no known
/// encoding. `labwire-core` maps these into its own failure taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The authenticate endpoint rejected the credentials, or returned
    /// something that is not a usable token.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// A request was still rejected with HTTP 401 after the single
    /// re-authentication the session is allowed to perform.
    #[error("{method} {endpoint} unauthorized after re-authentication")]
    Unauthorized { method: String, endpoint: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── API ─────────────────────────────────────────────────────────
    /// Any non-2xx response that is not an authorization failure.
    #[error("{method} {endpoint} failed (HTTP {status}): {body}")]
    Api {
        method: String,
        endpoint: String,
        status: u16,
        body: String,
    },

    /// A create call succeeded but the response named no identifier.
    #[error("{endpoint} response carried no id: {body}")]
    MissingId { endpoint: String, body: String },

    // ── Data ────────────────────────────────────────────────────────
    /// An identifier-list endpoint returned something that is neither a
    /// sequence, a mapping nor a string.
    #[error("Unexpected response shape from {endpoint}: {shape}")]
    UnexpectedShape { endpoint: String, shape: String },

    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the credentials were rejected or authorization
    /// could not be recovered by re-authenticating.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Authentication { .. } | Self::Unauthorized { .. })
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            _ => false,
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Unauthorized { .. } => Some(401),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
