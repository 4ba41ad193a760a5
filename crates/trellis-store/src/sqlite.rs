use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::{
  DefinitionRecord, NodeExecution, Store, StoreError, WorkflowExecution,
};

/// SQLite-based store implementation.
pub struct SqliteStore {
  pool: SqlitePool,
}

impl SqliteStore {
  /// Create a new SQLite store with the given connection pool.
  pub fn new(pool: SqlitePool) -> Self {
    Self { pool }
  }

  /// Run database migrations.
  pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(&self.pool).await
  }
}

#[async_trait]
impl Store for SqliteStore {
  async fn create_definition(&self, record: &DefinitionRecord) -> Result<(), StoreError> {
    sqlx::query(
            r#"
            INSERT INTO workflow_definitions (workflow_id, organization_id, name, is_active, definition, created_by, updated_by, created_at, updated_at, deleted_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.workflow_id)
        .bind(&record.organization_id)
        .bind(&record.name)
        .bind(record.is_active)
        .bind(&record.definition)
        .bind(&record.created_by)
        .bind(&record.updated_by)
        .bind(record.created_at)
        .bind(record.updated_at)
        .bind(record.deleted_at)
        .execute(&self.pool)
        .await?;

    Ok(())
  }

  async fn get_definition(
    &self,
    organization_id: &str,
    workflow_id: &str,
  ) -> Result<DefinitionRecord, StoreError> {
    sqlx::query_as(
      r#"
            SELECT workflow_id, organization_id, name, is_active, definition, created_by, updated_by, created_at, updated_at, deleted_at
            FROM workflow_definitions
            WHERE organization_id = ? AND workflow_id = ?
            "#,
    )
    .bind(organization_id)
    .bind(workflow_id)
    .fetch_optional(&self.pool)
    .await?
    .ok_or_else(|| StoreError::NotFound(format!("workflow definition {}", workflow_id)))
  }

  async fn update_definition(&self, record: &DefinitionRecord) -> Result<(), StoreError> {
    let result = sqlx::query(
      r#"
            UPDATE workflow_definitions
            SET name = ?, is_active = ?, definition = ?, updated_by = ?, updated_at = ?
            WHERE organization_id = ? AND workflow_id = ?
            "#,
    )
    .bind(&record.name)
    .bind(record.is_active)
    .bind(&record.definition)
    .bind(&record.updated_by)
    .bind(record.updated_at)
    .bind(&record.organization_id)
    .bind(&record.workflow_id)
    .execute(&self.pool)
    .await?;

    if result.rows_affected() == 0 {
      return Err(StoreError::NotFound(format!(
        "workflow definition {}",
        record.workflow_id
      )));
    }
    Ok(())
  }

  async fn delete_definition(
    &self,
    organization_id: &str,
    workflow_id: &str,
    deleted_at: DateTime<Utc>,
  ) -> Result<(), StoreError> {
    let result = sqlx::query(
      r#"
            UPDATE workflow_definitions
            SET deleted_at = ?
            WHERE organization_id = ? AND workflow_id = ? AND deleted_at IS NULL
            "#,
    )
    .bind(deleted_at)
    .bind(organization_id)
    .bind(workflow_id)
    .execute(&self.pool)
    .await?;

    if result.rows_affected() == 0 {
      return Err(StoreError::NotFound(format!(
        "workflow definition {}",
        workflow_id
      )));
    }
    Ok(())
  }

  async fn list_definitions(
    &self,
    organization_id: &str,
  ) -> Result<Vec<DefinitionRecord>, StoreError> {
    Ok(
      sqlx::query_as(
        r#"
            SELECT workflow_id, organization_id, name, is_active, definition, created_by, updated_by, created_at, updated_at, deleted_at
            FROM workflow_definitions
            WHERE organization_id = ? AND deleted_at IS NULL
            ORDER BY created_at
            "#,
      )
      .bind(organization_id)
      .fetch_all(&self.pool)
      .await?,
    )
  }

  async fn create_execution(&self, execution: &WorkflowExecution) -> Result<(), StoreError> {
    sqlx::query(
            r#"
            INSERT INTO workflow_executions (execution_id, workflow_id, organization_id, status, trigger_data, started_at, completed_at, execution_time_ms, error_message)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&execution.execution_id)
        .bind(&execution.workflow_id)
        .bind(&execution.organization_id)
        .bind(execution.status)
        .bind(&execution.trigger_data)
        .bind(execution.started_at)
        .bind(execution.completed_at)
        .bind(execution.execution_time_ms)
        .bind(&execution.error_message)
        .execute(&self.pool)
        .await?;

    Ok(())
  }

  async fn update_execution(&self, execution: &WorkflowExecution) -> Result<(), StoreError> {
    let result = sqlx::query(
      r#"
            UPDATE workflow_executions
            SET status = ?, completed_at = ?, execution_time_ms = ?, error_message = ?
            WHERE execution_id = ?
            "#,
    )
    .bind(execution.status)
    .bind(execution.completed_at)
    .bind(execution.execution_time_ms)
    .bind(&execution.error_message)
    .bind(&execution.execution_id)
    .execute(&self.pool)
    .await?;

    if result.rows_affected() == 0 {
      return Err(StoreError::NotFound(format!(
        "workflow execution {}",
        execution.execution_id
      )));
    }
    Ok(())
  }

  async fn get_execution(&self, execution_id: &str) -> Result<WorkflowExecution, StoreError> {
    sqlx::query_as(
      r#"
            SELECT execution_id, workflow_id, organization_id, status, trigger_data, started_at, completed_at, execution_time_ms, error_message
            FROM workflow_executions
            WHERE execution_id = ?
            "#,
    )
    .bind(execution_id)
    .fetch_optional(&self.pool)
    .await?
    .ok_or_else(|| StoreError::NotFound(format!("workflow execution {}", execution_id)))
  }

  async fn list_executions(
    &self,
    organization_id: &str,
    workflow_id: &str,
  ) -> Result<Vec<WorkflowExecution>, StoreError> {
    Ok(
      sqlx::query_as(
        r#"
            SELECT execution_id, workflow_id, organization_id, status, trigger_data, started_at, completed_at, execution_time_ms, error_message
            FROM workflow_executions
            WHERE organization_id = ? AND workflow_id = ?
            ORDER BY started_at DESC
            "#,
      )
      .bind(organization_id)
      .bind(workflow_id)
      .fetch_all(&self.pool)
      .await?,
    )
  }

  async fn create_node_execution(&self, node: &NodeExecution) -> Result<(), StoreError> {
    sqlx::query(
            r#"
            INSERT INTO workflow_node_executions (node_execution_id, execution_id, node_id, node_type, status, input_data, output_data, error_message, started_at, completed_at, execution_time_ms)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&node.node_execution_id)
        .bind(&node.execution_id)
        .bind(&node.node_id)
        .bind(&node.node_type)
        .bind(node.status)
        .bind(&node.input_data)
        .bind(&node.output_data)
        .bind(&node.error_message)
        .bind(node.started_at)
        .bind(node.completed_at)
        .bind(node.execution_time_ms)
        .execute(&self.pool)
        .await?;

    Ok(())
  }

  async fn update_node_execution(&self, node: &NodeExecution) -> Result<(), StoreError> {
    let result = sqlx::query(
      r#"
            UPDATE workflow_node_executions
            SET status = ?, output_data = ?, error_message = ?, completed_at = ?, execution_time_ms = ?
            WHERE node_execution_id = ?
            "#,
    )
    .bind(node.status)
    .bind(&node.output_data)
    .bind(&node.error_message)
    .bind(node.completed_at)
    .bind(node.execution_time_ms)
    .bind(&node.node_execution_id)
    .execute(&self.pool)
    .await?;

    if result.rows_affected() == 0 {
      return Err(StoreError::NotFound(format!(
        "node execution {}",
        node.node_execution_id
      )));
    }
    Ok(())
  }

  async fn list_node_executions(
    &self,
    execution_id: &str,
  ) -> Result<Vec<NodeExecution>, StoreError> {
    Ok(
      sqlx::query_as(
        r#"
            SELECT node_execution_id, execution_id, node_id, node_type, status, input_data, output_data, error_message, started_at, completed_at, execution_time_ms
            FROM workflow_node_executions
            WHERE execution_id = ?
            ORDER BY started_at
            "#,
      )
      .bind(execution_id)
      .fetch_all(&self.pool)
      .await?,
    )
  }
}
