use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use trellis_capability::Capabilities;
use trellis_config::WorkflowDef;
use trellis_engine::WorkflowService;
use trellis_host_http::ReqwestHttpClient;
use trellis_store::{MemoryStore, SqliteStore, Store};
use trellis_workflow::Workflow;

/// Trellis - a trigger-driven workflow execution engine
#[derive(Parser)]
#[command(name = "trellis")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the sqlite database (default: ~/.trellis/trellis.db when persisting)
  #[arg(long, global = true)]
  database: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Execute a workflow definition with a trigger payload from stdin
  Run {
    /// Path to the workflow definition file (JSON)
    workflow_file: PathBuf,

    /// Persist the definition and execution history to the database
    #[arg(long)]
    persist: bool,
  },

  /// Validate a workflow definition file
  Validate {
    /// Path to the workflow definition file (JSON)
    workflow_file: PathBuf,
  },

  /// Show execution history for a workflow
  History {
    /// The workflow ID
    workflow_id: String,

    /// The organization ID
    #[arg(long)]
    org: String,
  },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "trellis=info".into()),
    )
    .init();

  let cli = Cli::parse();

  let database = cli.database.unwrap_or_else(|| {
    dirs::home_dir()
      .expect("could not determine home directory")
      .join(".trellis")
      .join("trellis.db")
  });

  let rt = tokio::runtime::Runtime::new()?;
  match cli.command {
    Some(Commands::Run {
      workflow_file,
      persist,
    }) => rt.block_on(run_workflow(workflow_file, persist, database)),
    Some(Commands::Validate { workflow_file }) => rt.block_on(validate_workflow(workflow_file)),
    Some(Commands::History { workflow_id, org }) => {
      rt.block_on(show_history(workflow_id, org, database))
    }
    None => {
      println!("trellis - use --help to see available commands");
      Ok(())
    }
  }
}

async fn run_workflow(workflow_file: PathBuf, persist: bool, database: PathBuf) -> Result<()> {
  let def = read_definition(&workflow_file).await?;
  eprintln!("Loaded workflow: {}", def.name);

  let payload = read_payload_from_stdin()?;
  eprintln!("Payload: {}", payload);

  let store: Arc<dyn Store> = if persist {
    Arc::new(open_sqlite(&database).await?)
  } else {
    Arc::new(MemoryStore::new())
  };

  let capabilities = Capabilities::logging_with_http(Arc::new(ReqwestHttpClient::new()));
  let service = WorkflowService::new(store, capabilities);

  let organization_id = def.organization_id.clone();
  let workflow_id = def.workflow_id.clone();

  // Upsert so re-running a file keeps one definition row.
  if service
    .get_definition(&organization_id, &workflow_id)
    .await
    .is_ok()
  {
    service.update_definition(def, None).await?;
  } else {
    service.create_definition(def, None).await?;
  }

  let execution = service
    .trigger_workflow(&organization_id, &workflow_id, payload)
    .await
    .context("workflow execution failed to start")?;

  eprintln!(
    "Execution {} finished: {:?}",
    execution.execution_id, execution.status
  );
  if let Some(error) = &execution.error_message {
    eprintln!("Error: {}", error);
  }

  let history = service.node_history(&execution.execution_id).await?;
  eprintln!("Nodes executed: {}", history.len());

  println!("{}", serde_json::to_string_pretty(&history)?);
  Ok(())
}

async fn validate_workflow(workflow_file: PathBuf) -> Result<()> {
  let def = read_definition(&workflow_file).await?;

  match Workflow::lock(def) {
    Ok(workflow) => {
      println!(
        "OK: {} ({} nodes, start nodes: {})",
        workflow.name,
        workflow.node_count(),
        workflow.graph().start_nodes().join(", ")
      );
      Ok(())
    }
    Err(e) => anyhow::bail!("invalid workflow definition: {}", e),
  }
}

async fn show_history(workflow_id: String, org: String, database: PathBuf) -> Result<()> {
  let store = open_sqlite(&database).await?;

  let executions = store.list_executions(&org, &workflow_id).await?;
  println!("{}", serde_json::to_string_pretty(&executions)?);
  Ok(())
}

async fn read_definition(path: &PathBuf) -> Result<WorkflowDef> {
  let content = tokio::fs::read_to_string(path)
    .await
    .with_context(|| format!("failed to read workflow file: {}", path.display()))?;

  serde_json::from_str(&content)
    .with_context(|| format!("failed to parse workflow file: {}", path.display()))
}

async fn open_sqlite(path: &PathBuf) -> Result<SqliteStore> {
  if let Some(parent) = path.parent() {
    tokio::fs::create_dir_all(parent).await.ok();
  }

  let options = SqliteConnectOptions::new()
    .filename(path)
    .create_if_missing(true);
  let pool = SqlitePoolOptions::new()
    .connect_with(options)
    .await
    .with_context(|| format!("failed to open database: {}", path.display()))?;

  let store = SqliteStore::new(pool);
  store.migrate().await.context("failed to run migrations")?;
  Ok(store)
}

fn read_payload_from_stdin() -> Result<serde_json::Value> {
  use std::io::IsTerminal;

  if io::stdin().is_terminal() {
    // No stdin pipe, use empty object
    Ok(serde_json::json!({}))
  } else {
    let mut input = String::new();
    io::stdin()
      .read_to_string(&mut input)
      .context("failed to read payload from stdin")?;

    if input.trim().is_empty() {
      Ok(serde_json::json!({}))
    } else {
      serde_json::from_str(&input).context("failed to parse payload JSON from stdin")
    }
  }
}
