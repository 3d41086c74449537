//! Node command handlers.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use tabled::Tabled;

use labwire_core::{Identifier, NewNode, NodeDefinition, NodeDetail, Workbench};

use crate::cli::{NodesArgs, NodesCommand};
use crate::error::CliError;
use crate::output;

use super::{Ctx, identifier};

#[derive(Tabled)]
struct NodeRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Definition")]
    definition: String,
    #[tabled(rename = "State")]
    state: String,
}

impl From<&NodeDetail> for NodeRow {
    fn from(n: &NodeDetail) -> Self {
        Self {
            id: node_id(n),
            label: n.label.clone().unwrap_or_default(),
            definition: n.node_definition.clone().unwrap_or_default(),
            state: n.state.clone(),
        }
    }
}

#[derive(Tabled)]
struct DefinitionRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Interfaces")]
    interfaces: usize,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&NodeDefinition> for DefinitionRow {
    fn from(d: &NodeDefinition) -> Self {
        Self {
            id: d.id.clone(),
            kind: d.kind.clone().unwrap_or_default(),
            interfaces: d.interfaces.len(),
            description: d.description.clone().unwrap_or_default(),
        }
    }
}

fn node_id(n: &NodeDetail) -> String {
    n.id.as_ref().map(ToString::to_string).unwrap_or_default()
}

fn detail(n: &NodeDetail) -> String {
    [
        format!("ID:         {}", node_id(n)),
        format!("Label:      {}", n.label.as_deref().unwrap_or("-")),
        format!("Definition: {}", n.node_definition.as_deref().unwrap_or("-")),
        format!("State:      {}", n.state),
    ]
    .join("\n")
}

pub async fn handle(workbench: &Workbench, args: NodesArgs, ctx: Ctx) -> Result<(), CliError> {
    match args.command {
        NodesCommand::List { lab } => {
            let lab = identifier("lab", &lab)?;
            let mut nodes = Vec::new();
            for id in workbench.list_nodes(&lab).await? {
                nodes.push(fetch(workbench, &lab, id).await?);
            }
            let out = output::render_list(ctx.output, &nodes, |n| NodeRow::from(n), node_id)?;
            output::print_output(&out, ctx.quiet);
            Ok(())
        }

        NodesCommand::Show { lab, node } => {
            let lab = identifier("lab", &lab)?;
            let node = fetch(workbench, &lab, identifier("node", &node)?).await?;
            let out = output::render_single(ctx.output, &node, detail, node_id)?;
            output::print_output(&out, ctx.quiet);
            Ok(())
        }

        NodesCommand::Definitions => {
            let definitions = workbench.list_node_definitions().await?;
            let out = output::render_list(
                ctx.output,
                &definitions,
                |d| DefinitionRow::from(d),
                |d| d.id.clone(),
            )?;
            output::print_output(&out, ctx.quiet);
            Ok(())
        }

        NodesCommand::Add {
            lab,
            label,
            definition,
            x,
            y,
            no_interfaces,
            ram,
            cpu_limit,
            params,
        } => {
            let lab = identifier("lab", &lab)?;
            let mut node = NewNode::new(label.as_str(), definition);
            node.x = x;
            node.y = y;
            node.populate_interfaces = !no_interfaces;
            node.ram = ram;
            node.cpu_limit = cpu_limit;
            node.parameters = parse_params(&params)?;

            let id = workbench.add_node(&lab, &node).await?;
            output::status(&format!("Node '{label}' added"), ctx.quiet);
            output::print_output(id.as_str(), ctx.quiet);
            Ok(())
        }

        NodesCommand::Config { lab, node } => {
            let lab = identifier("lab", &lab)?;
            let node = identifier("node", &node)?;
            let config = workbench.get_node_config(&lab, &node).await?;
            output::print_output(config.trim_end(), ctx.quiet);
            Ok(())
        }

        NodesCommand::SetConfig { lab, node, file } => {
            let lab = identifier("lab", &lab)?;
            let node = identifier("node", &node)?;
            let config = read_input(&file)?;
            workbench.set_node_config(&lab, &node, &config).await?;
            output::status(
                &format!("Configuration pushed ({} bytes)", config.len()),
                ctx.quiet,
            );
            Ok(())
        }
    }
}

async fn fetch(workbench: &Workbench, lab: &Identifier, id: Identifier) -> Result<NodeDetail, CliError> {
    let mut node = workbench.get_node(lab, &id).await?;
    if node.id.is_none() {
        node.id = Some(id);
    }
    Ok(node)
}

fn parse_params(raw: &[String]) -> Result<BTreeMap<String, String>, CliError> {
    raw.iter()
        .map(|pair| {
            pair.split_once('=')
                .filter(|(key, _)| !key.is_empty())
                .map(|(key, value)| (key.to_owned(), value.to_owned()))
                .ok_or_else(|| CliError::Validation {
                    field: "param".into(),
                    reason: format!("expected KEY=VALUE, got '{pair}'"),
                })
        })
        .collect()
}

fn read_input(path: &Path) -> Result<String, CliError> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        Ok(std::fs::read_to_string(path)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn params_parse_key_value_pairs() {
        let parsed = parse_params(&["smart_annotations=off".into(), "a=b=c".into()]).unwrap();
        assert_eq!(parsed.get("smart_annotations").map(String::as_str), Some("off"));
        assert_eq!(parsed.get("a").map(String::as_str), Some("b=c"));
    }

    #[test]
    fn params_without_key_are_rejected() {
        assert!(parse_params(&["=value".into()]).is_err());
        assert!(parse_params(&["novalue".into()]).is_err());
    }
}
