//! Definition CRUD and the trigger surface.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::info;
use trellis_capability::Capabilities;
use trellis_config::WorkflowDef;
use trellis_executor::{ExecutionError, ExecutionNotifier, NoopNotifier, WorkflowExecutor};
use trellis_store::{
  DefinitionRecord, Json, NodeExecution, Store, WorkflowExecution,
};
use trellis_workflow::Workflow;

use crate::error::EngineError;

/// The engine's outward surface: definition CRUD with write-time validation,
/// plus the synchronous trigger API.
///
/// Every definition write is validated by locking it first, so the executor
/// only ever sees structurally sound graphs. Each trigger locks its own
/// snapshot of the stored definition: concurrent updates never affect an
/// execution already in flight.
pub struct WorkflowService<N: ExecutionNotifier = NoopNotifier> {
  store: Arc<dyn Store>,
  executor: WorkflowExecutor<N>,
}

impl WorkflowService<NoopNotifier> {
  /// Create a service with no-op execution notifications.
  pub fn new(store: Arc<dyn Store>, capabilities: Capabilities) -> Self {
    Self {
      executor: WorkflowExecutor::new(store.clone(), capabilities),
      store,
    }
  }
}

impl<N: ExecutionNotifier> WorkflowService<N> {
  /// Create a service with a custom execution notifier.
  pub fn with_notifier(
    store: Arc<dyn Store>,
    capabilities: Capabilities,
    notifier: N,
  ) -> Self {
    Self {
      executor: WorkflowExecutor::with_notifier(store.clone(), capabilities, notifier),
      store,
    }
  }

  /// Validate and persist a new definition.
  pub async fn create_definition(
    &self,
    def: WorkflowDef,
    created_by: Option<String>,
  ) -> Result<DefinitionRecord, EngineError> {
    Workflow::lock(def.clone())?;

    let now = Utc::now();
    let record = DefinitionRecord {
      workflow_id: def.workflow_id.clone(),
      organization_id: def.organization_id.clone(),
      name: def.name.clone(),
      is_active: def.is_active,
      definition: Json(def),
      created_by: created_by.clone(),
      updated_by: created_by,
      created_at: now,
      updated_at: now,
      deleted_at: None,
    };
    self.store.create_definition(&record).await?;

    info!(
      workflow_id = %record.workflow_id,
      organization_id = %record.organization_id,
      "definition_created"
    );
    Ok(record)
  }

  /// Validate and persist an updated definition.
  ///
  /// In-flight executions are unaffected; they run on the snapshot they
  /// locked at trigger time.
  pub async fn update_definition(
    &self,
    def: WorkflowDef,
    updated_by: Option<String>,
  ) -> Result<DefinitionRecord, EngineError> {
    Workflow::lock(def.clone())?;

    let mut record = self
      .store
      .get_definition(&def.organization_id, &def.workflow_id)
      .await?;
    record.name = def.name.clone();
    record.is_active = def.is_active;
    record.definition = Json(def);
    record.updated_by = updated_by;
    record.updated_at = Utc::now();
    self.store.update_definition(&record).await?;

    info!(
      workflow_id = %record.workflow_id,
      organization_id = %record.organization_id,
      "definition_updated"
    );
    Ok(record)
  }

  /// Soft-delete a definition. Historical executions are retained.
  pub async fn delete_definition(
    &self,
    organization_id: &str,
    workflow_id: &str,
  ) -> Result<(), EngineError> {
    self
      .store
      .delete_definition(organization_id, workflow_id, Utc::now())
      .await?;

    info!(
      workflow_id = %workflow_id,
      organization_id = %organization_id,
      "definition_deleted"
    );
    Ok(())
  }

  /// Fetch a definition record.
  pub async fn get_definition(
    &self,
    organization_id: &str,
    workflow_id: &str,
  ) -> Result<DefinitionRecord, EngineError> {
    Ok(self.store.get_definition(organization_id, workflow_id).await?)
  }

  /// List live definitions for an organization.
  pub async fn list_definitions(
    &self,
    organization_id: &str,
  ) -> Result<Vec<DefinitionRecord>, EngineError> {
    Ok(self.store.list_definitions(organization_id).await?)
  }

  /// Trigger a workflow and block until it reaches a terminal state.
  ///
  /// The returned execution is terminal (`success` or `failed`); callers
  /// inspect node history for per-step detail.
  pub async fn trigger_workflow(
    &self,
    organization_id: &str,
    workflow_id: &str,
    trigger_data: Value,
  ) -> Result<WorkflowExecution, EngineError> {
    let record = self
      .store
      .get_definition(organization_id, workflow_id)
      .await?;

    if !record.is_executable() {
      return Err(
        ExecutionError::DefinitionInactive {
          workflow_id: workflow_id.to_string(),
        }
        .into(),
      );
    }

    // Snapshot: the execution runs on the definition as stored right now,
    // regardless of concurrent updates.
    let workflow = Workflow::lock(record.definition.0.clone())?;

    Ok(self.executor.execute(&workflow, trigger_data).await?)
  }

  /// List executions for a workflow, most recent first.
  pub async fn list_executions(
    &self,
    organization_id: &str,
    workflow_id: &str,
  ) -> Result<Vec<WorkflowExecution>, EngineError> {
    Ok(
      self
        .store
        .list_executions(organization_id, workflow_id)
        .await?,
    )
  }

  /// Per-node history of one execution, ordered by start time.
  pub async fn node_history(
    &self,
    execution_id: &str,
  ) -> Result<Vec<NodeExecution>, EngineError> {
    Ok(self.store.list_node_executions(execution_id).await?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use trellis_capability::mock::MockCapabilities;
  use trellis_store::{ExecutionStatus, MemoryStore};
  use trellis_workflow::WorkflowError;

  fn sample_def() -> WorkflowDef {
    serde_json::from_value(json!({
      "workflow_id": "wf-1",
      "organization_id": "org-1",
      "name": "Announce",
      "trigger_type": "event",
      "nodes": [
        {
          "node_id": "announce",
          "type": "notification",
          "title": "Hello",
          "message": "{{trigger.name}} triggered"
        }
      ]
    }))
    .unwrap()
  }

  fn service() -> (WorkflowService, MockCapabilities) {
    let mocks = MockCapabilities::with_http_response(200, json!({}));
    let service = WorkflowService::new(Arc::new(MemoryStore::new()), mocks.capabilities());
    (service, mocks)
  }

  #[tokio::test]
  async fn test_create_rejects_invalid_definition() {
    let (service, _) = service();
    let mut def = sample_def();
    def.nodes[0].connections.on_success = vec!["ghost".to_string()];

    let err = service.create_definition(def, None).await.unwrap_err();
    assert!(matches!(
      err,
      EngineError::Validation(WorkflowError::InvalidEdge { .. })
    ));
  }

  #[tokio::test]
  async fn test_trigger_persists_execution_and_history() {
    let (service, mocks) = service();
    service.create_definition(sample_def(), None).await.unwrap();

    let execution = service
      .trigger_workflow("org-1", "wf-1", json!({"name": "Ada"}))
      .await
      .unwrap();

    assert_eq!(execution.status, ExecutionStatus::Success);
    assert_eq!(mocks.notifier.notified()[0].message, "Ada triggered");

    let executions = service.list_executions("org-1", "wf-1").await.unwrap();
    assert_eq!(executions.len(), 1);
    assert_eq!(executions[0].execution_id, execution.execution_id);

    let history = service.node_history(&execution.execution_id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].node_id, "announce");
  }

  #[tokio::test]
  async fn test_deleted_definition_cannot_trigger_but_keeps_history() {
    let (service, _) = service();
    service.create_definition(sample_def(), None).await.unwrap();

    let execution = service
      .trigger_workflow("org-1", "wf-1", json!({"name": "Ada"}))
      .await
      .unwrap();

    service.delete_definition("org-1", "wf-1").await.unwrap();

    let err = service
      .trigger_workflow("org-1", "wf-1", json!({}))
      .await
      .unwrap_err();
    assert!(matches!(
      err,
      EngineError::Execution(ExecutionError::DefinitionInactive { .. })
    ));

    // Audit history survives the delete.
    let history = service.node_history(&execution.execution_id).await.unwrap();
    assert_eq!(history.len(), 1);
  }

  #[tokio::test]
  async fn test_update_preserves_created_audit_fields() {
    let (service, _) = service();
    let created = service
      .create_definition(sample_def(), Some("alice".to_string()))
      .await
      .unwrap();

    let mut def = sample_def();
    def.name = "Announce v2".to_string();
    let updated = service
      .update_definition(def, Some("bob".to_string()))
      .await
      .unwrap();

    assert_eq!(updated.created_by.as_deref(), Some("alice"));
    assert_eq!(updated.updated_by.as_deref(), Some("bob"));
    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(updated.name, "Announce v2");
  }
}
