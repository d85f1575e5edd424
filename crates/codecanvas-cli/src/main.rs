use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use codecanvas_storage::{CanvasWorkspace, Storage, layout::WorkspaceLayout};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect saved code canvas workspaces", long_about = None)]
struct Args {
    /// Path to the SQLite database
    #[arg(short, long, default_value = "codecanvas.db")]
    db: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List workspaces, most recently updated first
    List,
    /// Print one workspace with its decoded layout
    Show { id: Uuid },
    /// Delete a workspace
    Delete { id: Uuid },
    /// Write a workspace as pretty JSON
    Export {
        id: Uuid,
        /// Output file; stdout when omitted
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

/// A workspace with its layout decoded, as shown and exported.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WorkspaceDocument<'a> {
    name: &'a str,
    unique_id: Uuid,
    camera: [f64; 2],
    canvas_scale: f64,
    group_id_set: &'a [u64],
    updated_at: String,
    layout: WorkspaceLayout,
}

impl<'a> WorkspaceDocument<'a> {
    fn new(workspace: &'a CanvasWorkspace) -> Result<Self> {
        let layout = WorkspaceLayout::from_json(&workspace.serialized_state)
            .with_context(|| format!("Workspace {} has an unreadable layout", workspace.unique_id))?;
        Ok(Self {
            name: &workspace.name,
            unique_id: workspace.unique_id,
            camera: [workspace.camera_position.x, workspace.camera_position.y],
            canvas_scale: workspace.canvas_scale,
            group_id_set: &workspace.group_id_set,
            updated_at: workspace.updated_at.to_rfc3339(),
            layout,
        })
    }

    fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let storage = Storage::open(&args.db)
        .with_context(|| format!("Failed to open database {}", args.db.display()))?;
    run(&storage, args.command)
}

fn run(storage: &Storage, command: Command) -> Result<()> {
    match command {
        Command::List => {
            let workspaces = storage.list_workspaces()?;
            if workspaces.is_empty() {
                println!("No saved workspaces.");
            }
            for line in workspaces.iter().map(summary_line) {
                println!("{line}");
            }
        }
        Command::Show { id } => {
            let workspace = find(storage, id)?;
            println!("{}", WorkspaceDocument::new(&workspace)?.to_pretty_json()?);
        }
        Command::Delete { id } => {
            if !storage.delete_workspace(id)? {
                bail!("No workspace with id {id}");
            }
            tracing::info!("Deleted workspace {}", id);
        }
        Command::Export { id, out } => {
            let workspace = find(storage, id)?;
            let json = WorkspaceDocument::new(&workspace)?.to_pretty_json()?;
            match out {
                Some(path) => export_to(&path, &json)?,
                None => println!("{json}"),
            }
        }
    }
    Ok(())
}

fn find(storage: &Storage, id: Uuid) -> Result<CanvasWorkspace> {
    storage
        .get_workspace(id)?
        .with_context(|| format!("No workspace with id {id}"))
}

fn export_to(path: &Path, json: &str) -> Result<()> {
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Exported workspace to {}", path.display());
    Ok(())
}

fn summary_line(workspace: &CanvasWorkspace) -> String {
    format!(
        "{}  {:<24} {:>3} editors  scale {:.2}  updated {}",
        workspace.unique_id,
        workspace.name,
        workspace.group_id_set.len(),
        workspace.canvas_scale,
        workspace.updated_at.format("%Y-%m-%d %H:%M:%S")
    )
}
