// ── Core error types ──
//
// Failures surfaced to collaborators above the core (CLI, tool dispatch,
// troubleshooting engine). The `From<labwire_api::Error>` impl sorts
// session-layer errors into transport, auth, shape and not-found failures;
// link negotiation and interface resolution add their own variants.

use std::fmt::Write as _;

use thiserror::Error;

use labwire_api::Identifier;

use crate::negotiator::VariantAttempt;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach lab server: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Unexpected response shape from {endpoint}: {shape}")]
    UnexpectedShape { endpoint: String, shape: String },

    #[error("Not found: {endpoint}")]
    NotFound { endpoint: String },

    /// Precondition for linking: the node has no free physical interface.
    #[error("No available physical interface on node {node} in lab {lab}")]
    NoAvailableInterface { lab: Identifier, node: Identifier },

    // ── Operation errors ─────────────────────────────────────────────
    /// Every link payload variant was tried and none produced a link.
    #[error(
        "Link creation in lab {lab} failed for every payload variant: {}",
        describe_attempts(.attempts)
    )]
    LinkVariantsExhausted {
        lab: Identifier,
        attempts: Vec<VariantAttempt>,
    },

    #[error("Operation rejected: {message}")]
    Rejected { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// Endpoint path the failing call went to.
        endpoint: Option<String>,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::AuthenticationFailed { .. })
    }

    /// Missing resources, including the "no free interface" precondition.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::NoAvailableInterface { .. }
        )
    }
}

fn describe_attempts(attempts: &[VariantAttempt]) -> String {
    if attempts.is_empty() {
        return "no variants configured".into();
    }
    let mut out = String::new();
    for (i, attempt) in attempts.iter().enumerate() {
        if i > 0 {
            out.push_str("; ");
        }
        let _ = write!(out, "{} -> {}", attempt.variant, attempt.error);
    }
    out
}

// ── Conversion from session-layer errors ─────────────────────────────

impl From<labwire_api::Error> for CoreError {
    fn from(err: labwire_api::Error) -> Self {
        use labwire_api::Error as Api;

        match err {
            Api::Transport(e) => Self::ConnectionFailed {
                reason: e.to_string(),
            },
            Api::Tls(reason) => Self::ConnectionFailed { reason },
            Api::InvalidUrl(e) => Self::Config {
                message: format!("invalid URL: {e}"),
            },
            Api::Authentication { message } => Self::AuthenticationFailed { message },
            Api::Unauthorized { method, endpoint } => Self::AuthenticationFailed {
                message: format!("{method} {endpoint} still unauthorized after re-authenticating"),
            },
            Api::UnexpectedShape { endpoint, shape } => Self::UnexpectedShape { endpoint, shape },
            Api::Api {
                status: 404,
                endpoint,
                ..
            } => Self::NotFound { endpoint },
            Api::Api {
                method,
                endpoint,
                status,
                body,
            } => Self::Api {
                message: format!("{method} {endpoint} returned HTTP {status}: {body}"),
                endpoint: Some(endpoint),
                status: Some(status),
            },
            Api::MissingId { endpoint, body } => Self::Rejected {
                message: format!("{endpoint} returned no id: {body}"),
            },
            Api::Deserialization { message, .. } => Self::Api {
                message,
                endpoint: None,
                status: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::negotiator::LinkPayload;

    #[test]
    fn api_404_maps_to_not_found() {
        let err = CoreError::from(labwire_api::Error::Api {
            method: "GET".into(),
            endpoint: "/api/v0/labs/x".into(),
            status: 404,
            body: "Lab not found".into(),
        });
        assert!(err.is_not_found());
    }

    #[test]
    fn unauthorized_maps_to_auth_failure() {
        let err = CoreError::from(labwire_api::Error::Unauthorized {
            method: "GET".into(),
            endpoint: "/api/v0/labs".into(),
        });
        assert!(err.is_auth_failure());
        assert!(err.to_string().contains("/api/v0/labs"));
    }

    #[test]
    fn exhausted_message_names_every_variant() {
        let err = CoreError::LinkVariantsExhausted {
            lab: Identifier::from("lab"),
            attempts: vec![
                VariantAttempt {
                    variant: LinkPayload::InterfacePair,
                    status: Some(422),
                    error: "HTTP 422".into(),
                },
                VariantAttempt {
                    variant: LinkPayload::SourceDestination,
                    status: Some(400),
                    error: "HTTP 400".into(),
                },
            ],
        };
        let text = err.to_string();
        assert!(text.contains("i1/i2 -> HTTP 422"), "{text}");
        assert!(text.contains("src_int/dst_int -> HTTP 400"), "{text}");
    }
}
