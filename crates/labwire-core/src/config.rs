// ── Runtime connection configuration ──
//
// Describes how to reach one lab server. Carries credentials and
// connection tuning but never touches disk: the CLI (or any other
// collaborator) builds a `ConnectionConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use labwire_api::{Credentials, TlsMode, TransportConfig, transport::DEFAULT_TIMEOUT};

use crate::negotiator::LinkPayload;
use crate::readiness::DEFAULT_POLL_INTERVAL;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed lab servers).
    DangerAcceptInvalid,
}

impl From<&TlsVerification> for TlsMode {
    fn from(tls: &TlsVerification) -> Self {
        match tls {
            TlsVerification::SystemDefaults => Self::System,
            TlsVerification::CustomCa(path) => Self::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => Self::DangerAcceptInvalid,
        }
    }
}

/// Configuration for connecting to a single lab server.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Server URL (e.g., `https://cml.example.net`).
    pub url: Url,
    pub username: String,
    pub password: SecretString,
    pub tls: TlsVerification,
    /// Per-call HTTP timeout.
    pub timeout: Duration,
    /// Pause between readiness polling ticks.
    pub poll_interval: Duration,
    /// Link payload variants, in the order they are tried.
    pub link_order: Vec<LinkPayload>,
}

impl ConnectionConfig {
    pub fn new(url: Url, username: impl Into<String>, password: SecretString) -> Self {
        Self {
            url,
            username: username.into(),
            password,
            tls: TlsVerification::default(),
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            link_order: LinkPayload::preference(),
        }
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig::default()
            .with_tls(TlsMode::from(&self.tls))
            .with_timeout(self.timeout)
    }

    pub(crate) fn credentials(&self) -> Credentials {
        Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_verify_tls_and_bound_every_call() {
        let url = Url::parse("https://lab.example").unwrap();
        let config = ConnectionConfig::new(url, "admin", SecretString::from("pw".to_string()));
        let transport = config.transport();
        assert_eq!(transport.tls, TlsMode::System);
        assert_eq!(transport.timeout, Duration::from_secs(30));
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.link_order, LinkPayload::preference());
    }

    #[test]
    fn tls_modes_map_onto_transport() {
        assert_eq!(
            TlsMode::from(&TlsVerification::CustomCa("/etc/ca.pem".into())),
            TlsMode::CustomCa("/etc/ca.pem".into())
        );
        assert_eq!(
            TlsMode::from(&TlsVerification::DangerAcceptInvalid),
            TlsMode::DangerAcceptInvalid
        );
    }
}
