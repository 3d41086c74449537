//! Lab command handlers.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Tabled;

use labwire_core::{Identifier, LabDetail, Readiness, ReadinessSample, SampleState, Workbench};

use crate::cli::{LabsArgs, LabsCommand};
use crate::error::CliError;
use crate::output;

use super::{Ctx, identifier};

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct LabRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Nodes")]
    nodes: String,
    #[tabled(rename = "Links")]
    links: String,
}

impl From<&LabDetail> for LabRow {
    fn from(lab: &LabDetail) -> Self {
        Self {
            id: lab_id(lab),
            title: lab.title.clone().unwrap_or_default(),
            state: lab.state.clone(),
            nodes: lab.node_count.map(|n| n.to_string()).unwrap_or_default(),
            links: lab.link_count.map(|n| n.to_string()).unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
struct SampleRow {
    #[tabled(rename = "Node")]
    node: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "State")]
    state: String,
}

impl From<&ReadinessSample> for SampleRow {
    fn from(s: &ReadinessSample) -> Self {
        Self {
            node: s.node.to_string(),
            label: s.label.clone().unwrap_or_default(),
            state: match &s.state {
                SampleState::Observed(state) => state.clone(),
                SampleState::Failed(err) => format!("error: {err}"),
            },
        }
    }
}

fn lab_id(lab: &LabDetail) -> String {
    lab.id.as_ref().map(ToString::to_string).unwrap_or_default()
}

fn detail(lab: &LabDetail) -> String {
    [
        format!("ID:          {}", lab_id(lab)),
        format!("Title:       {}", lab.title.as_deref().unwrap_or("-")),
        format!("Description: {}", lab.description.as_deref().unwrap_or("-")),
        format!("State:       {}", lab.state),
        format!(
            "Nodes:       {}",
            lab.node_count.map_or_else(|| "-".into(), |n| n.to_string())
        ),
        format!(
            "Links:       {}",
            lab.link_count.map_or_else(|| "-".into(), |n| n.to_string())
        ),
    ]
    .join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(workbench: &Workbench, args: LabsArgs, ctx: Ctx) -> Result<(), CliError> {
    match args.command {
        LabsCommand::List => {
            let mut labs = Vec::new();
            for id in workbench.list_labs().await? {
                let mut lab = workbench.get_lab(&id).await?;
                if lab.id.is_none() {
                    lab.id = Some(id);
                }
                labs.push(lab);
            }
            let out = output::render_list(ctx.output, &labs, |l| LabRow::from(l), lab_id)?;
            output::print_output(&out, ctx.quiet);
            Ok(())
        }

        LabsCommand::Show { lab } => {
            let id = identifier("lab", &lab)?;
            let mut lab = workbench.get_lab(&id).await?;
            if lab.id.is_none() {
                lab.id = Some(id);
            }
            let out = output::render_single(ctx.output, &lab, detail, lab_id)?;
            output::print_output(&out, ctx.quiet);
            Ok(())
        }

        LabsCommand::Create { title, description } => {
            let id = workbench.create_lab(&title, &description).await?;
            output::status(&format!("Lab '{title}' created"), ctx.quiet);
            output::print_output(id.as_str(), ctx.quiet);
            Ok(())
        }

        LabsCommand::Delete { lab } => {
            let id = identifier("lab", &lab)?;
            workbench.delete_lab(&id).await?;
            output::status("Lab deleted", ctx.quiet);
            Ok(())
        }

        LabsCommand::Start {
            lab,
            wait,
            deadline,
        } => {
            let id = identifier("lab", &lab)?;
            workbench.start_lab(&id).await?;
            output::status("Lab start requested", ctx.quiet);
            if wait {
                wait_until_ready(workbench, &id, deadline, ctx).await?;
            }
            Ok(())
        }

        LabsCommand::Stop { lab } => {
            let id = identifier("lab", &lab)?;
            workbench.stop_lab(&id).await?;
            output::status("Lab stopped", ctx.quiet);
            Ok(())
        }

        LabsCommand::Wait { lab, deadline } => {
            let id = identifier("lab", &lab)?;
            wait_until_ready(workbench, &id, deadline, ctx).await
        }
    }
}

// ── Readiness ───────────────────────────────────────────────────────

async fn wait_until_ready(
    workbench: &Workbench,
    lab: &Identifier,
    deadline: Duration,
    ctx: Ctx,
) -> Result<(), CliError> {
    let spinner = spinner(
        &format!("Waiting up to {} for nodes to start", humantime::format_duration(deadline)),
        ctx.quiet,
    );
    let readiness = workbench.wait_until_ready(lab, deadline).await;
    spinner.finish_and_clear();

    match readiness? {
        Readiness::NotStarted { state } => Err(CliError::Rejected {
            message: format!("lab {lab} is {state}, not STARTED; start it first"),
        }),
        Readiness::Ready {
            nodes, elapsed, ..
        } => {
            output::status(
                &format!(
                    "All {} node(s) started in {}",
                    nodes.len(),
                    humantime::format_duration(round_secs(elapsed))
                ),
                ctx.quiet,
            );
            render_samples(&nodes, ctx)
        }
        Readiness::TimedOut {
            pending,
            ready,
            elapsed,
            ..
        } => {
            let all: Vec<_> = ready.iter().chain(pending.iter()).cloned().collect();
            render_samples(&all, ctx)?;
            Err(CliError::NotReady {
                lab: lab.to_string(),
                pending: pending.len(),
                waited: humantime::format_duration(round_secs(elapsed)).to_string(),
            })
        }
    }
}

fn render_samples(samples: &[ReadinessSample], ctx: Ctx) -> Result<(), CliError> {
    let out = output::render_list(ctx.output, samples, |s| SampleRow::from(s), |s| {
        s.node.to_string()
    })?;
    output::print_output(&out, ctx.quiet);
    Ok(())
}

fn spinner(message: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} [{elapsed}]") {
        bar.set_style(style);
    }
    bar.set_message(message.to_owned());
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

fn round_secs(d: Duration) -> Duration {
    Duration::from_secs(d.as_secs())
}
