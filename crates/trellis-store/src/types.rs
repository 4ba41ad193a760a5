use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use sqlx::types::Json;
use trellis_config::WorkflowDef;

/// Status of a workflow execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ExecutionStatus {
  Running,
  Success,
  Failed,
}

/// Status of a single node execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum NodeExecutionStatus {
  Running,
  Success,
  Failed,
}

/// A workflow definition as stored, with audit columns around the
/// serializable definition blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DefinitionRecord {
  pub workflow_id: String,
  pub organization_id: String,
  pub name: String,
  pub is_active: bool,
  pub definition: Json<WorkflowDef>,
  pub created_by: Option<String>,
  pub updated_by: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub deleted_at: Option<DateTime<Utc>>,
}

impl DefinitionRecord {
  /// Whether this definition may be executed.
  pub fn is_executable(&self) -> bool {
    self.is_active && self.deleted_at.is_none()
  }
}

/// One run of a workflow definition. Immutable once terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct WorkflowExecution {
  pub execution_id: String,
  pub workflow_id: String,
  pub organization_id: String,
  pub status: ExecutionStatus,
  pub trigger_data: Json<Value>,
  pub started_at: DateTime<Utc>,
  pub completed_at: Option<DateTime<Utc>>,
  pub execution_time_ms: Option<i64>,
  pub error_message: Option<String>,
}

/// The record of one node's invocation within one execution.
///
/// At most one row exists per (execution, node) pair; the executor's visited
/// set guarantees a node never runs twice in the same execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct NodeExecution {
  pub node_execution_id: String,
  pub execution_id: String,
  pub node_id: String,
  pub node_type: String,
  pub status: NodeExecutionStatus,
  /// Variable context snapshot at invocation.
  pub input_data: Json<Value>,
  pub output_data: Option<Json<Value>>,
  pub error_message: Option<String>,
  pub started_at: DateTime<Utc>,
  pub completed_at: Option<DateTime<Utc>>,
  pub execution_time_ms: Option<i64>,
}
