//! In-memory store for tests and one-shot CLI runs.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
  DefinitionRecord, NodeExecution, Store, StoreError, WorkflowExecution,
};

#[derive(Default)]
struct Inner {
  /// (organization_id, workflow_id) -> record
  definitions: HashMap<(String, String), DefinitionRecord>,
  executions: HashMap<String, WorkflowExecution>,
  node_executions: Vec<NodeExecution>,
}

/// A store that keeps everything behind a mutex in process memory.
#[derive(Default)]
pub struct MemoryStore {
  inner: Mutex<Inner>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl Store for MemoryStore {
  async fn create_definition(&self, record: &DefinitionRecord) -> Result<(), StoreError> {
    let mut inner = self.inner.lock().unwrap();
    inner.definitions.insert(
      (record.organization_id.clone(), record.workflow_id.clone()),
      record.clone(),
    );
    Ok(())
  }

  async fn get_definition(
    &self,
    organization_id: &str,
    workflow_id: &str,
  ) -> Result<DefinitionRecord, StoreError> {
    let inner = self.inner.lock().unwrap();
    inner
      .definitions
      .get(&(organization_id.to_string(), workflow_id.to_string()))
      .cloned()
      .ok_or_else(|| StoreError::NotFound(format!("workflow definition {}", workflow_id)))
  }

  async fn update_definition(&self, record: &DefinitionRecord) -> Result<(), StoreError> {
    let mut inner = self.inner.lock().unwrap();
    let key = (record.organization_id.clone(), record.workflow_id.clone());
    if !inner.definitions.contains_key(&key) {
      return Err(StoreError::NotFound(format!(
        "workflow definition {}",
        record.workflow_id
      )));
    }
    inner.definitions.insert(key, record.clone());
    Ok(())
  }

  async fn delete_definition(
    &self,
    organization_id: &str,
    workflow_id: &str,
    deleted_at: DateTime<Utc>,
  ) -> Result<(), StoreError> {
    let mut inner = self.inner.lock().unwrap();
    let record = inner
      .definitions
      .get_mut(&(organization_id.to_string(), workflow_id.to_string()))
      .ok_or_else(|| StoreError::NotFound(format!("workflow definition {}", workflow_id)))?;
    record.deleted_at = Some(deleted_at);
    Ok(())
  }

  async fn list_definitions(
    &self,
    organization_id: &str,
  ) -> Result<Vec<DefinitionRecord>, StoreError> {
    let inner = self.inner.lock().unwrap();
    let mut records: Vec<DefinitionRecord> = inner
      .definitions
      .values()
      .filter(|r| r.organization_id == organization_id && r.deleted_at.is_none())
      .cloned()
      .collect();
    records.sort_by_key(|r| r.created_at);
    Ok(records)
  }

  async fn create_execution(&self, execution: &WorkflowExecution) -> Result<(), StoreError> {
    let mut inner = self.inner.lock().unwrap();
    inner
      .executions
      .insert(execution.execution_id.clone(), execution.clone());
    Ok(())
  }

  async fn update_execution(&self, execution: &WorkflowExecution) -> Result<(), StoreError> {
    let mut inner = self.inner.lock().unwrap();
    if !inner.executions.contains_key(&execution.execution_id) {
      return Err(StoreError::NotFound(format!(
        "workflow execution {}",
        execution.execution_id
      )));
    }
    inner
      .executions
      .insert(execution.execution_id.clone(), execution.clone());
    Ok(())
  }

  async fn get_execution(&self, execution_id: &str) -> Result<WorkflowExecution, StoreError> {
    let inner = self.inner.lock().unwrap();
    inner
      .executions
      .get(execution_id)
      .cloned()
      .ok_or_else(|| StoreError::NotFound(format!("workflow execution {}", execution_id)))
  }

  async fn list_executions(
    &self,
    organization_id: &str,
    workflow_id: &str,
  ) -> Result<Vec<WorkflowExecution>, StoreError> {
    let inner = self.inner.lock().unwrap();
    let mut executions: Vec<WorkflowExecution> = inner
      .executions
      .values()
      .filter(|e| e.organization_id == organization_id && e.workflow_id == workflow_id)
      .cloned()
      .collect();
    executions.sort_by_key(|e| std::cmp::Reverse(e.started_at));
    Ok(executions)
  }

  async fn create_node_execution(&self, node: &NodeExecution) -> Result<(), StoreError> {
    let mut inner = self.inner.lock().unwrap();
    inner.node_executions.push(node.clone());
    Ok(())
  }

  async fn update_node_execution(&self, node: &NodeExecution) -> Result<(), StoreError> {
    let mut inner = self.inner.lock().unwrap();
    let existing = inner
      .node_executions
      .iter_mut()
      .find(|n| n.node_execution_id == node.node_execution_id)
      .ok_or_else(|| {
        StoreError::NotFound(format!("node execution {}", node.node_execution_id))
      })?;
    *existing = node.clone();
    Ok(())
  }

  async fn list_node_executions(
    &self,
    execution_id: &str,
  ) -> Result<Vec<NodeExecution>, StoreError> {
    let inner = self.inner.lock().unwrap();
    let mut nodes: Vec<NodeExecution> = inner
      .node_executions
      .iter()
      .filter(|n| n.execution_id == execution_id)
      .cloned()
      .collect();
    nodes.sort_by_key(|n| n.started_at);
    Ok(nodes)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use sqlx::types::Json;
  use trellis_config::{TriggerType, WorkflowDef};

  fn record(org: &str, id: &str) -> DefinitionRecord {
    let now = Utc::now();
    DefinitionRecord {
      workflow_id: id.to_string(),
      organization_id: org.to_string(),
      name: id.to_string(),
      is_active: true,
      definition: Json(WorkflowDef {
        workflow_id: id.to_string(),
        organization_id: org.to_string(),
        name: id.to_string(),
        description: None,
        is_active: true,
        trigger_type: TriggerType::Manual,
        trigger_config: serde_json::Map::new(),
        nodes: vec![],
      }),
      created_by: None,
      updated_by: None,
      created_at: now,
      updated_at: now,
      deleted_at: None,
    }
  }

  #[tokio::test]
  async fn test_definitions_are_organization_scoped() {
    let store = MemoryStore::new();
    store.create_definition(&record("org-a", "wf-1")).await.unwrap();
    store.create_definition(&record("org-b", "wf-1")).await.unwrap();

    assert!(store.get_definition("org-a", "wf-1").await.is_ok());
    assert_eq!(store.list_definitions("org-a").await.unwrap().len(), 1);
    assert!(store.get_definition("org-c", "wf-1").await.is_err());
  }

  #[tokio::test]
  async fn test_soft_delete_hides_from_list_but_not_get() {
    let store = MemoryStore::new();
    store.create_definition(&record("org-a", "wf-1")).await.unwrap();
    store
      .delete_definition("org-a", "wf-1", Utc::now())
      .await
      .unwrap();

    assert!(store.list_definitions("org-a").await.unwrap().is_empty());
    let fetched = store.get_definition("org-a", "wf-1").await.unwrap();
    assert!(fetched.deleted_at.is_some());
    assert!(!fetched.is_executable());
  }

  #[tokio::test]
  async fn test_node_executions_are_ordered_by_start_time() {
    let store = MemoryStore::new();
    let node = |id: &str, started_at: DateTime<Utc>| NodeExecution {
      node_execution_id: id.to_string(),
      execution_id: "ex-1".to_string(),
      node_id: id.to_string(),
      node_type: "delay".to_string(),
      status: crate::NodeExecutionStatus::Success,
      input_data: Json(serde_json::json!({})),
      output_data: None,
      error_message: None,
      started_at,
      completed_at: None,
      execution_time_ms: None,
    };

    let now = Utc::now();
    store
      .create_node_execution(&node("second", now))
      .await
      .unwrap();
    store
      .create_node_execution(&node("first", now - chrono::Duration::seconds(5)))
      .await
      .unwrap();

    let history = store.list_node_executions("ex-1").await.unwrap();
    let order: Vec<&str> = history.iter().map(|n| n.node_id.as_str()).collect();
    assert_eq!(order, ["first", "second"]);
  }

  #[tokio::test]
  async fn test_update_missing_execution_is_not_found() {
    let store = MemoryStore::new();
    let execution = WorkflowExecution {
      execution_id: "missing".to_string(),
      workflow_id: "wf-1".to_string(),
      organization_id: "org-a".to_string(),
      status: crate::ExecutionStatus::Running,
      trigger_data: Json(serde_json::json!({})),
      started_at: Utc::now(),
      completed_at: None,
      execution_time_ms: None,
      error_message: None,
    };

    assert!(matches!(
      store.update_execution(&execution).await,
      Err(StoreError::NotFound(_))
    ));
  }
}
