//! Trellis Store
//!
//! This crate provides the storage trait and implementations for workflow
//! definitions and execution history. Definitions are ordinary
//! organization-scoped CRUD rows (soft-deleted, never cascaded); execution
//! history is append-only, one row per execution plus one per node visited.
//!
//! The [`Store`] trait defines operations for:
//! - Definition CRUD (organization-scoped, soft delete)
//! - Creating and finalizing workflow executions
//! - Recording node executions as they transition `running -> terminal`
//! - Querying execution history

mod memory;
mod sqlite;
mod types;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use sqlx::types::Json;
pub use types::{
  DefinitionRecord, ExecutionStatus, NodeExecution, NodeExecutionStatus, WorkflowExecution,
};

use async_trait::async_trait;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  /// The requested record was not found.
  #[error("not found: {0}")]
  NotFound(String),

  /// A database error occurred.
  #[error("database error: {0}")]
  Database(#[from] sqlx::Error),
}

/// Storage trait for workflow definitions and execution history.
#[async_trait]
pub trait Store: Send + Sync {
  /// Create a new workflow definition record.
  async fn create_definition(&self, record: &DefinitionRecord) -> Result<(), StoreError>;

  /// Get a definition by ID within an organization (including soft-deleted;
  /// callers decide whether a deleted definition is usable).
  async fn get_definition(
    &self,
    organization_id: &str,
    workflow_id: &str,
  ) -> Result<DefinitionRecord, StoreError>;

  /// Replace a definition record.
  async fn update_definition(&self, record: &DefinitionRecord) -> Result<(), StoreError>;

  /// Soft-delete a definition. Execution history is retained for audit.
  async fn delete_definition(
    &self,
    organization_id: &str,
    workflow_id: &str,
    deleted_at: chrono::DateTime<chrono::Utc>,
  ) -> Result<(), StoreError>;

  /// List live (not soft-deleted) definitions for an organization.
  async fn list_definitions(
    &self,
    organization_id: &str,
  ) -> Result<Vec<DefinitionRecord>, StoreError>;

  /// Create a new workflow execution.
  async fn create_execution(&self, execution: &WorkflowExecution) -> Result<(), StoreError>;

  /// Replace a workflow execution (used to finalize status and timings).
  async fn update_execution(&self, execution: &WorkflowExecution) -> Result<(), StoreError>;

  /// Get a workflow execution by ID.
  async fn get_execution(&self, execution_id: &str) -> Result<WorkflowExecution, StoreError>;

  /// List executions for a workflow, most recent first.
  async fn list_executions(
    &self,
    organization_id: &str,
    workflow_id: &str,
  ) -> Result<Vec<WorkflowExecution>, StoreError>;

  /// Create a new node execution record.
  async fn create_node_execution(&self, node: &NodeExecution) -> Result<(), StoreError>;

  /// Replace a node execution record (running -> terminal transition).
  async fn update_node_execution(&self, node: &NodeExecution) -> Result<(), StoreError>;

  /// List node executions for an execution, ordered by start time.
  async fn list_node_executions(
    &self,
    execution_id: &str,
  ) -> Result<Vec<NodeExecution>, StoreError>;
}
