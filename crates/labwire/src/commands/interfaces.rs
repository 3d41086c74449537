//! Interface command handlers.

use tabled::Tabled;

use labwire_core::{InterfaceDescriptor, Workbench};

use crate::cli::{InterfacesArgs, InterfacesCommand};
use crate::error::CliError;
use crate::output;

use super::{Ctx, identifier};

#[derive(Tabled)]
struct InterfaceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Connected")]
    connected: String,
}

impl From<&InterfaceDescriptor> for InterfaceRow {
    fn from(d: &InterfaceDescriptor) -> Self {
        Self {
            id: d.id.to_string(),
            label: d.label.clone().unwrap_or_default(),
            kind: d.kind.to_string(),
            connected: if d.connected { "yes" } else { "no" }.into(),
        }
    }
}

fn detail(d: &InterfaceDescriptor) -> String {
    [
        format!("ID:        {}", d.id),
        format!("Label:     {}", d.label.as_deref().unwrap_or("-")),
        format!("Kind:      {}", d.kind),
        format!("Connected: {}", d.connected),
    ]
    .join("\n")
}

pub async fn handle(
    workbench: &Workbench,
    args: InterfacesArgs,
    ctx: Ctx,
) -> Result<(), CliError> {
    match args.command {
        InterfacesCommand::List {
            lab,
            node,
            physical,
        } => {
            let lab = identifier("lab", &lab)?;
            let node = identifier("node", &node)?;
            let descriptors = if physical {
                workbench.list_physical(&lab, &node).await?
            } else {
                let resolver = workbench.resolver();
                let mut all = Vec::new();
                for id in resolver.list_interfaces(&lab, &node).await? {
                    all.push(resolver.describe_interface(&lab, &id).await?);
                }
                all
            };
            let out = output::render_list(
                ctx.output,
                &descriptors,
                |d| InterfaceRow::from(d),
                |d| d.id.to_string(),
            )?;
            output::print_output(&out, ctx.quiet);
            Ok(())
        }

        InterfacesCommand::Available { lab, node } => {
            let lab = identifier("lab", &lab)?;
            let node = identifier("node", &node)?;
            let found = workbench
                .find_available_physical(&lab, &node)
                .await?
                .ok_or_else(|| CliError::NoAvailableInterface {
                    lab: lab.to_string(),
                    node: node.to_string(),
                })?;
            let out = output::render_single(ctx.output, &found, detail, |d| d.id.to_string())?;
            output::print_output(&out, ctx.quiet);
            Ok(())
        }

        InterfacesCommand::Create { lab, node, slot } => {
            let lab = identifier("lab", &lab)?;
            let node = identifier("node", &node)?;
            let id = workbench.create_interface(&lab, &node, slot).await?;
            output::status(&format!("Interface created in slot {slot}"), ctx.quiet);
            output::print_output(id.as_str(), ctx.quiet);
            Ok(())
        }
    }
}
