//! Clap derive structures for the `labwire` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// labwire -- build and wire network-emulation labs from the command line
#[derive(Debug, Parser)]
#[command(
    name = "labwire",
    version,
    about = "Build and wire network-emulation labs from the command line",
    long_about = "Drives a lab server's REST API.\n\n\
        Creates labs and nodes, links nodes through free physical interfaces,\n\
        pushes startup configuration and waits for nodes to boot.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Server profile to use
    #[arg(long, short = 'p', env = "LABWIRE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Server URL (overrides profile)
    #[arg(long, short = 'u', env = "LABWIRE_URL", global = true)]
    pub url: Option<String>,

    /// Username (overrides profile)
    #[arg(long, env = "LABWIRE_USERNAME", global = true)]
    pub username: Option<String>,

    /// Output format
    #[arg(long, short = 'o', env = "LABWIRE_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "LABWIRE_INSECURE", global = true)]
    pub insecure: bool,

    /// Per-request timeout in seconds
    #[arg(long, env = "LABWIRE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Plain text, one value per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create, inspect, start and stop labs
    #[command(alias = "lab")]
    Labs(LabsArgs),

    /// Add and configure nodes
    #[command(alias = "node", alias = "n")]
    Nodes(NodesArgs),

    /// Inspect and add node interfaces
    #[command(alias = "if", alias = "i")]
    Interfaces(InterfacesArgs),

    /// Connect interfaces and nodes with links
    #[command(alias = "link", alias = "l")]
    Links(LinksArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Labs ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LabsArgs {
    #[command(subcommand)]
    pub command: LabsCommand,
}

#[derive(Debug, Subcommand)]
pub enum LabsCommand {
    /// List labs
    #[command(alias = "ls")]
    List,

    /// Show lab details
    Show { lab: String },

    /// Create an empty lab
    Create {
        title: String,

        #[arg(long, short = 'd', default_value = "")]
        description: String,
    },

    /// Delete a lab (stops it first if running)
    #[command(alias = "rm")]
    Delete { lab: String },

    /// Start a lab
    Start {
        lab: String,

        /// Wait for every node to boot
        #[arg(long, short = 'w')]
        wait: bool,

        /// How long to wait with --wait (e.g. "90s", "5m")
        #[arg(long, default_value = "5m", value_parser = humantime::parse_duration)]
        deadline: Duration,
    },

    /// Stop a lab
    Stop { lab: String },

    /// Wait for every node in a started lab to boot
    Wait {
        lab: String,

        /// Give up after this long (e.g. "90s", "5m")
        #[arg(long, default_value = "5m", value_parser = humantime::parse_duration)]
        deadline: Duration,
    },
}

// ── Nodes ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct NodesArgs {
    #[command(subcommand)]
    pub command: NodesCommand,
}

#[derive(Debug, Subcommand)]
pub enum NodesCommand {
    /// List nodes in a lab
    #[command(alias = "ls")]
    List { lab: String },

    /// Show node details
    Show { lab: String, node: String },

    /// List node definitions available on the server
    #[command(alias = "defs")]
    Definitions,

    /// Add a node to a lab
    Add {
        lab: String,
        label: String,

        /// Node definition (e.g. "iosv", "alpine")
        #[arg(long, short = 'd')]
        definition: String,

        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        x: i32,

        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        y: i32,

        /// Do not create the definition's default interfaces
        #[arg(long)]
        no_interfaces: bool,

        /// RAM in MB
        #[arg(long)]
        ram: Option<u32>,

        /// CPU limit in percent
        #[arg(long)]
        cpu_limit: Option<u32>,

        /// Extra node parameter, repeatable
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },

    /// Print a node's startup configuration
    Config { lab: String, node: String },

    /// Replace a node's startup configuration
    SetConfig {
        lab: String,
        node: String,

        /// File holding the configuration ("-" for stdin)
        #[arg(long, short = 'f')]
        file: PathBuf,
    },
}

// ── Interfaces ───────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct InterfacesArgs {
    #[command(subcommand)]
    pub command: InterfacesCommand,
}

#[derive(Debug, Subcommand)]
pub enum InterfacesCommand {
    /// List a node's interfaces with kind and connection state
    #[command(alias = "ls")]
    List {
        lab: String,
        node: String,

        /// Only physical interfaces
        #[arg(long)]
        physical: bool,
    },

    /// Show the first physical interface not yet connected
    Available { lab: String, node: String },

    /// Add an interface to a node (lab must be stopped)
    Create {
        lab: String,
        node: String,

        #[arg(long, short = 's')]
        slot: u32,
    },
}

// ── Links ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LinksArgs {
    #[command(subcommand)]
    pub command: LinksCommand,
}

#[derive(Debug, Subcommand)]
pub enum LinksCommand {
    /// List links in a lab
    #[command(alias = "ls")]
    List { lab: String },

    /// Link two interfaces
    Create {
        lab: String,
        interface_a: String,
        interface_b: String,
    },

    /// Link two nodes through their first free physical interfaces
    Connect {
        lab: String,
        node_a: String,
        node_b: String,
    },

    /// Delete a link
    #[command(alias = "rm")]
    Delete { lab: String, link: String },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    pub shell: clap_complete::Shell,
}
