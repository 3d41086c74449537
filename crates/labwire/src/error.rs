//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and process exit codes.

use miette::Diagnostic;
use thiserror::Error;

use labwire_config::ConfigError;
use labwire_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const REJECTED: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the lab server: {reason}")]
    #[diagnostic(
        code(labwire::connection_failed),
        help(
            "Check that the server is running and reachable.\n\
             Self-signed certificate? Retry with --insecure (-k) or set ca_cert in your profile."
        )
    )]
    ConnectionFailed { reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(labwire::auth_failed),
        help(
            "Verify the username and password for profile '{profile}'.\n\
             The password is read from the profile's password_env, LABWIRE_PASSWORD,\n\
             the system keyring (service 'labwire', entry '{profile}/password'), then the profile."
        )
    )]
    AuthFailed { profile: String, message: String },

    #[error("No {missing} configured for profile '{profile}'")]
    #[diagnostic(
        code(labwire::no_credentials),
        help("Add it to the profile, or set LABWIRE_USERNAME / LABWIRE_PASSWORD.")
    )]
    NoCredentials {
        profile: String,
        missing: &'static str,
    },

    // ── Resources ────────────────────────────────────────────────────
    #[error("Not found: {endpoint}")]
    #[diagnostic(
        code(labwire::not_found),
        help("Run: labwire labs list (or nodes/links list <lab>) to see valid identifiers")
    )]
    NotFound { endpoint: String },

    #[error("Node {node} has no free physical interface")]
    #[diagnostic(
        code(labwire::no_available_interface),
        help(
            "Stop the lab and add one with:\n  \
             labwire interfaces create {lab} {node} --slot <N>"
        )
    )]
    NoAvailableInterface { lab: String, node: String },

    #[error("The server rejected every link payload variant")]
    #[diagnostic(
        code(labwire::link_failed),
        help("Attempts: {attempts}\nCheck that both interfaces exist and are unconnected.")
    )]
    LinkFailed { attempts: String },

    #[error("Unexpected response from {endpoint}: {shape}")]
    #[diagnostic(
        code(labwire::unexpected_shape),
        help("The server answered in a format this version does not understand.")
    )]
    UnexpectedShape { endpoint: String, shape: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("Operation rejected: {message}")]
    #[diagnostic(code(labwire::rejected))]
    Rejected { message: String },

    #[error("API error: {message}")]
    #[diagnostic(code(labwire::api_error))]
    ApiError {
        message: String,
        status: Option<u16>,
    },

    // ── Readiness ────────────────────────────────────────────────────
    #[error("{pending} node(s) in lab {lab} still not started after {waited}")]
    #[diagnostic(
        code(labwire::not_ready),
        help("Nodes may just be slow to boot; rerun labwire labs wait with a longer --deadline.")
    )]
    NotReady {
        lab: String,
        pending: usize,
        waited: String,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(labwire::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(labwire::profile_not_found),
        help("Available profiles: {available}\nConfig file: {path}")
    )]
    ProfileNotFound {
        name: String,
        available: String,
        path: String,
    },

    #[error("No server configured")]
    #[diagnostic(
        code(labwire::no_config),
        help(
            "Pass --url (or LABWIRE_URL), or add a profile to the config file.\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(labwire::config))]
    Config(Box<ConfigError>),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON rendering failed: {0}")]
    #[diagnostic(code(labwire::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::NoAvailableInterface { .. } => exit_code::NOT_FOUND,
            Self::LinkFailed { .. } | Self::Rejected { .. } => exit_code::REJECTED,
            Self::NotReady { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NoConfig { .. } | Self::ProfileNotFound { .. } => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }

    /// Attach the active profile name to authentication failures.
    pub fn for_profile(self, profile: &str) -> Self {
        match self {
            Self::AuthFailed { message, .. } => Self::AuthFailed {
                profile: profile.into(),
                message,
            },
            other => other,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { reason } => Self::ConnectionFailed { reason },

            CoreError::AuthenticationFailed { message } => Self::AuthFailed {
                profile: "default".into(),
                message,
            },

            CoreError::UnexpectedShape { endpoint, shape } => {
                Self::UnexpectedShape { endpoint, shape }
            }

            CoreError::NotFound { endpoint } => Self::NotFound { endpoint },

            CoreError::NoAvailableInterface { lab, node } => Self::NoAvailableInterface {
                lab: lab.to_string(),
                node: node.to_string(),
            },

            CoreError::LinkVariantsExhausted { attempts, .. } => Self::LinkFailed {
                attempts: attempts
                    .iter()
                    .map(|a| format!("{} -> {}", a.variant, a.error))
                    .collect::<Vec<_>>()
                    .join("; "),
            },

            CoreError::Rejected { message } => Self::Rejected { message },

            CoreError::Api {
                message, status, ..
            } => Self::ApiError { message, status },

            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { profile, missing } => {
                Self::NoCredentials { profile, missing }
            }
            ConfigError::ProfileNotFound { profile, path } => Self::ProfileNotFound {
                name: profile,
                available: String::new(),
                path: path.display().to_string(),
            },
            other => Self::Config(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labwire_core::{Identifier, LinkPayload, VariantAttempt};

    #[test]
    fn exit_codes_follow_failure_class() {
        let not_free = CliError::from(CoreError::NoAvailableInterface {
            lab: Identifier::from("lab"),
            node: Identifier::from("node"),
        });
        assert_eq!(not_free.exit_code(), exit_code::NOT_FOUND);

        let auth = CliError::from(CoreError::AuthenticationFailed {
            message: "403".into(),
        })
        .for_profile("lab");
        assert_eq!(auth.exit_code(), exit_code::AUTH);
        assert!(matches!(auth, CliError::AuthFailed { ref profile, .. } if profile == "lab"));

        let conn = CliError::from(CoreError::ConnectionFailed {
            reason: "refused".into(),
        });
        assert_eq!(conn.exit_code(), exit_code::CONNECTION);
    }

    #[test]
    fn exhausted_variants_are_listed() {
        let err = CliError::from(CoreError::LinkVariantsExhausted {
            lab: Identifier::from("lab"),
            attempts: vec![VariantAttempt {
                variant: LinkPayload::InterfacePair,
                status: Some(400),
                error: "bad".into(),
            }],
        });
        match err {
            CliError::LinkFailed { attempts } => assert_eq!(attempts, "i1/i2 -> bad"),
            other => panic!("expected LinkFailed, got: {other:?}"),
        }
    }
}
