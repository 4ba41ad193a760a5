//! Workflow runner with channel-based triggering.
//!
//! The `WorkflowRunner` owns an mpsc channel for receiving trigger payloads
//! for one workflow and drains it through the [`WorkflowService`]. Callers
//! that hold a sender (webhook endpoints, schedulers, admin UIs) stay
//! decoupled from execution.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use trellis_executor::ExecutionNotifier;
use trellis_store::{ExecutionStatus, WorkflowExecution};

use crate::error::EngineError;
use crate::service::WorkflowService;

/// A runner that executes one workflow in response to trigger payloads.
///
/// # Usage
///
/// ```ignore
/// let runner = WorkflowRunner::new(service, "org-1", "wf-1");
///
/// // Hand out senders to trigger sources
/// let sender = runner.sender();
///
/// // Drain the channel until shutdown
/// let cancel = CancellationToken::new();
/// runner.start(cancel).await?;
/// ```
///
/// Cancellation stops accepting new triggers; an execution already in
/// flight always runs to a terminal state first.
pub struct WorkflowRunner<N: ExecutionNotifier = trellis_executor::NoopNotifier> {
  sender: mpsc::Sender<Value>,
  receiver: mpsc::Receiver<Value>,
  service: Arc<WorkflowService<N>>,
  organization_id: String,
  workflow_id: String,
}

impl<N: ExecutionNotifier> WorkflowRunner<N> {
  /// Create a new runner for a workflow.
  pub fn new(
    service: Arc<WorkflowService<N>>,
    organization_id: impl Into<String>,
    workflow_id: impl Into<String>,
  ) -> Self {
    Self::with_buffer_size(service, organization_id, workflow_id, 100)
  }

  /// Create a new runner with a custom channel buffer size.
  pub fn with_buffer_size(
    service: Arc<WorkflowService<N>>,
    organization_id: impl Into<String>,
    workflow_id: impl Into<String>,
    buffer_size: usize,
  ) -> Self {
    let (sender, receiver) = mpsc::channel(buffer_size);
    Self {
      sender,
      receiver,
      service,
      organization_id: organization_id.into(),
      workflow_id: workflow_id.into(),
    }
  }

  /// Get a sender handle for triggering workflow executions.
  pub fn sender(&self) -> mpsc::Sender<Value> {
    self.sender.clone()
  }

  /// Trigger an execution by sending through the channel.
  pub async fn run(&self, payload: Value) -> Result<(), EngineError> {
    self
      .sender
      .send(payload)
      .await
      .map_err(|_| EngineError::ChannelClosed)
  }

  /// Drain the trigger channel until cancellation or channel close.
  pub async fn start(mut self, cancel: CancellationToken) -> Result<(), EngineError> {
    info!(
      workflow_id = %self.workflow_id,
      organization_id = %self.organization_id,
      "starting workflow runner"
    );

    loop {
      tokio::select! {
          _ = cancel.cancelled() => {
              info!(workflow_id = %self.workflow_id, "workflow runner cancelled");
              break;
          }
          payload = self.receiver.recv() => {
              match payload {
                  Some(payload) => {
                      info!(workflow_id = %self.workflow_id, "triggering workflow execution");

                      let result = self
                          .service
                          .trigger_workflow(&self.organization_id, &self.workflow_id, payload)
                          .await;

                      match result {
                          Ok(execution) => {
                              if execution.status == ExecutionStatus::Failed {
                                  error!(
                                      workflow_id = %self.workflow_id,
                                      execution_id = %execution.execution_id,
                                      error = execution.error_message.as_deref().unwrap_or(""),
                                      "workflow execution failed"
                                  );
                              } else {
                                  info!(
                                      workflow_id = %self.workflow_id,
                                      execution_id = %execution.execution_id,
                                      "workflow execution completed"
                                  );
                              }
                          }
                          Err(e) => {
                              error!(
                                  workflow_id = %self.workflow_id,
                                  error = %e,
                                  "workflow trigger failed"
                              );
                          }
                      }
                  }
                  None => {
                      info!(workflow_id = %self.workflow_id, "workflow runner channel closed");
                      break;
                  }
              }
          }
      }
    }

    Ok(())
  }

  /// Execute a single trigger synchronously (without the loop).
  ///
  /// Useful for tests or one-shot invocations.
  pub async fn execute_once(&self, payload: Value) -> Result<WorkflowExecution, EngineError> {
    self
      .service
      .trigger_workflow(&self.organization_id, &self.workflow_id, payload)
      .await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use std::time::Duration;
  use trellis_capability::mock::MockCapabilities;
  use trellis_store::MemoryStore;

  async fn create_test_service() -> Arc<WorkflowService> {
    let mocks = MockCapabilities::with_http_response(200, json!({}));
    let service = WorkflowService::new(Arc::new(MemoryStore::new()), mocks.capabilities());

    let def = serde_json::from_value(json!({
      "workflow_id": "wf-1",
      "organization_id": "org-1",
      "name": "Pause",
      "trigger_type": "manual",
      "nodes": [ { "node_id": "pause", "type": "delay", "duration": 0 } ]
    }))
    .unwrap();
    service.create_definition(def, None).await.unwrap();

    Arc::new(service)
  }

  #[tokio::test]
  async fn test_sender_cloning() {
    let service = create_test_service().await;
    let runner = WorkflowRunner::new(service, "org-1", "wf-1");

    let sender1 = runner.sender();
    let sender2 = runner.sender();

    assert!(!sender1.is_closed());
    assert!(!sender2.is_closed());
  }

  #[tokio::test]
  async fn test_run_sends_to_channel() {
    let service = create_test_service().await;
    let mut runner = WorkflowRunner::new(service, "org-1", "wf-1");

    runner.run(json!({"test": "data"})).await.unwrap();

    let received = runner.receiver.recv().await;
    assert!(received.is_some());
    assert_eq!(received.unwrap()["test"], "data");
  }

  #[tokio::test]
  async fn test_execute_once_reaches_terminal_state() {
    let service = create_test_service().await;
    let runner = WorkflowRunner::new(service, "org-1", "wf-1");

    let execution = runner.execute_once(json!({})).await.unwrap();
    assert_eq!(execution.status, ExecutionStatus::Success);
  }

  #[tokio::test]
  async fn test_cancellation_stops_the_loop() {
    let service = create_test_service().await;
    let runner = WorkflowRunner::new(service, "org-1", "wf-1");

    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();

    let handle = tokio::spawn(async move { runner.start(cancel_clone).await });

    tokio::time::sleep(Duration::from_millis(10)).await;
    cancel.cancel();

    let result = handle.await.unwrap();
    assert!(result.is_ok());
  }

  #[tokio::test]
  async fn test_loop_processes_sent_payloads() {
    let service = create_test_service().await;
    let runner = WorkflowRunner::new(service.clone(), "org-1", "wf-1");
    let sender = runner.sender();

    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    let handle = tokio::spawn(async move { runner.start(cancel_clone).await });

    sender.send(json!({})).await.unwrap();

    // Give the loop a moment to drain the channel, then shut down.
    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();
    handle.await.unwrap().unwrap();

    let executions = service.list_executions("org-1", "wf-1").await.unwrap();
    assert_eq!(executions.len(), 1);
    assert_eq!(executions[0].status, ExecutionStatus::Success);
  }
}
