//! Command dispatch: bridges CLI args -> workbench calls -> output formatting.

pub mod interfaces;
pub mod labs;
pub mod links;
pub mod nodes;

use labwire_core::{Identifier, Workbench};

use crate::cli::{Command, GlobalOpts, OutputFormat};
use crate::error::CliError;

/// Per-invocation rendering context.
#[derive(Debug, Clone, Copy)]
pub struct Ctx {
    pub output: OutputFormat,
    pub quiet: bool,
}

/// Dispatch a server-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    workbench: &Workbench,
    global: &GlobalOpts,
    output: OutputFormat,
) -> Result<(), CliError> {
    let ctx = Ctx {
        output,
        quiet: global.quiet,
    };
    match cmd {
        Command::Labs(args) => labs::handle(workbench, args, ctx).await,
        Command::Nodes(args) => nodes::handle(workbench, args, ctx).await,
        Command::Interfaces(args) => interfaces::handle(workbench, args, ctx).await,
        Command::Links(args) => links::handle(workbench, args, ctx).await,
        // Handled before a workbench exists
        Command::Completions(_) => Ok(()),
    }
}

/// Identifiers are opaque; reject obviously empty ones before a round trip.
pub(crate) fn identifier(field: &str, raw: &str) -> Result<Identifier, CliError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CliError::Validation {
            field: field.into(),
            reason: "must not be empty".into(),
        });
    }
    Ok(Identifier::from(trimmed))
}
