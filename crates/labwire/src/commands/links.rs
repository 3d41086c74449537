//! Link command handlers.

use tabled::Tabled;

use labwire_core::{Identifier, LinkOutcome, Workbench};

use crate::cli::{LinksArgs, LinksCommand};
use crate::error::CliError;
use crate::output;

use super::{Ctx, identifier};

#[derive(Tabled)]
struct LinkRow {
    #[tabled(rename = "ID")]
    id: String,
}

fn outcome_detail(o: &LinkOutcome) -> String {
    let mut lines = vec![
        format!("Link:      {}", o.link),
        format!("Interface: {} <-> {}", o.interface_a, o.interface_b),
        format!("Payload:   {}", o.variant),
    ];
    for attempt in &o.failed_attempts {
        lines.push(format!("Rejected:  {} ({})", attempt.variant, attempt.error));
    }
    lines.join("\n")
}

pub async fn handle(workbench: &Workbench, args: LinksArgs, ctx: Ctx) -> Result<(), CliError> {
    match args.command {
        LinksCommand::List { lab } => {
            let lab = identifier("lab", &lab)?;
            let links = workbench.list_links(&lab).await?;
            let out = output::render_list(
                ctx.output,
                &links,
                |l: &Identifier| LinkRow { id: l.to_string() },
                ToString::to_string,
            )?;
            output::print_output(&out, ctx.quiet);
            Ok(())
        }

        LinksCommand::Create {
            lab,
            interface_a,
            interface_b,
        } => {
            let lab = identifier("lab", &lab)?;
            let a = identifier("interface_a", &interface_a)?;
            let b = identifier("interface_b", &interface_b)?;
            let outcome = workbench.link_interfaces(&lab, &a, &b).await?;
            print_outcome(&outcome, ctx)
        }

        LinksCommand::Connect {
            lab,
            node_a,
            node_b,
        } => {
            let lab = identifier("lab", &lab)?;
            let a = identifier("node_a", &node_a)?;
            let b = identifier("node_b", &node_b)?;
            let outcome = workbench.link_nodes(&lab, &a, &b).await?;
            print_outcome(&outcome, ctx)
        }

        LinksCommand::Delete { lab, link } => {
            let lab = identifier("lab", &lab)?;
            let link = identifier("link", &link)?;
            workbench.delete_link(&lab, &link).await?;
            output::status("Link deleted", ctx.quiet);
            Ok(())
        }
    }
}

fn print_outcome(outcome: &LinkOutcome, ctx: Ctx) -> Result<(), CliError> {
    let out = output::render_single(ctx.output, outcome, outcome_detail, |o| o.link.to_string())?;
    output::print_output(&out, ctx.quiet);
    Ok(())
}
