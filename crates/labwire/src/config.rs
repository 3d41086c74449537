//! Global flags layered over the loaded profile.
//!
//! Core never sees these types: this is the one place where flags, the
//! config file and the environment collapse into a `ConnectionConfig`.

use clap::ValueEnum;

use labwire_config::{Config, Profile};
use labwire_core::ConnectionConfig;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

/// Everything a command needs besides its own arguments.
#[derive(Debug)]
pub struct Resolved {
    pub profile: String,
    pub connection: ConnectionConfig,
    pub output: OutputFormat,
}

/// Resolve the active profile name from flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.active_profile_name(global.profile.as_deref())
}

/// Output format: flag, else the config default, else a table.
pub fn output_format(global: &GlobalOpts, config: &Config) -> OutputFormat {
    global
        .output
        .or_else(|| OutputFormat::from_str(&config.defaults.output, true).ok())
        .unwrap_or(OutputFormat::Table)
}

/// Load the config file and apply flag overrides (flag > env > profile).
pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let config = labwire_config::load_config()?;
    resolve_with(global, &config)
}

pub fn resolve_with(global: &GlobalOpts, config: &Config) -> Result<Resolved, CliError> {
    let name = active_profile_name(global, config);
    let mut profile = base_profile(global, config, &name)?;

    if let Some(ref url) = global.url {
        profile.url.clone_from(url);
    }
    if let Some(ref username) = global.username {
        profile.username = Some(username.clone());
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }

    let connection = labwire_config::profile_to_connection_config(&profile, &name, &config.defaults)?;

    Ok(Resolved {
        profile: name,
        connection,
        output: output_format(global, config),
    })
}

fn base_profile(global: &GlobalOpts, config: &Config, name: &str) -> Result<Profile, CliError> {
    if let Some(profile) = config.profiles.get(name) {
        return Ok(profile.clone());
    }

    // An explicitly requested profile must exist.
    if global.profile.is_some() {
        let mut available: Vec<_> = config.profiles.keys().cloned().collect();
        available.sort();
        return Err(CliError::ProfileNotFound {
            name: name.into(),
            available: if available.is_empty() {
                "(none)".into()
            } else {
                available.join(", ")
            },
            path: labwire_config::config_path().display().to_string(),
        });
    }

    // No profile: flags and environment alone.
    let url = global.url.clone().ok_or_else(|| CliError::NoConfig {
        path: labwire_config::config_path().display().to_string(),
    })?;
    Ok(Profile {
        url,
        ..Profile::default()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use clap::Parser;
    use labwire_core::TlsVerification;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["labwire"];
        argv.extend_from_slice(args);
        argv.extend_from_slice(&["labs", "list"]);
        Cli::try_parse_from(argv).unwrap().global
    }

    fn config_with_lab_profile() -> Config {
        let mut config = Config::default();
        config.default_profile = Some("lab".into());
        config.defaults.output = "json".into();
        config.profiles.insert(
            "lab".into(),
            Profile {
                url: "https://cml.example.net".into(),
                username: Some("admin".into()),
                password: Some("pw".into()),
                timeout: Some(10),
                ..Profile::default()
            },
        );
        config
    }

    #[test]
    fn flags_override_profile() {
        let config = config_with_lab_profile();
        let resolved = resolve_with(
            &global(&["--url", "https://10.1.1.1", "-k", "--timeout", "90", "-o", "plain"]),
            &config,
        )
        .unwrap();

        assert_eq!(resolved.profile, "lab");
        assert_eq!(resolved.connection.url.as_str(), "https://10.1.1.1/");
        assert_eq!(resolved.connection.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(resolved.connection.timeout, Duration::from_secs(90));
        assert_eq!(resolved.output, OutputFormat::Plain);
    }

    #[test]
    fn profile_values_apply_without_flags() {
        let config = config_with_lab_profile();
        let resolved = resolve_with(&global(&[]), &config).unwrap();

        assert_eq!(resolved.connection.username, "admin");
        assert_eq!(resolved.connection.timeout, Duration::from_secs(10));
        assert_eq!(resolved.output, OutputFormat::Json);
    }

    #[test]
    fn unknown_explicit_profile_lists_available() {
        let config = config_with_lab_profile();
        let err = resolve_with(&global(&["--profile", "prod"]), &config).unwrap_err();
        match err {
            CliError::ProfileNotFound { name, available, .. } => {
                assert_eq!(name, "prod");
                assert_eq!(available, "lab");
            }
            other => panic!("expected ProfileNotFound, got: {other:?}"),
        }
    }

    #[test]
    fn no_profile_and_no_url_is_no_config() {
        let err = resolve_with(&global(&[]), &Config::default()).unwrap_err();
        assert!(matches!(err, CliError::NoConfig { .. }));
    }
}
