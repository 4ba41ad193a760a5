//! The graph executor.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{error, info, instrument, warn};
use trellis_capability::Capabilities;
use trellis_store::{
  ExecutionStatus, Json, NodeExecution, NodeExecutionStatus, Store, WorkflowExecution,
};
use trellis_workflow::Workflow;

use crate::context::Context;
use crate::error::ExecutionError;
use crate::events::{ExecutionEvent, ExecutionNotifier, NoopNotifier};
use crate::handler::run_node;

/// Executes locked workflows and records their history.
///
/// Generic over `N: ExecutionNotifier` to allow different notification
/// strategies. Use `WorkflowExecutor::new()` for a default executor with
/// no-op notifications, or `WorkflowExecutor::with_notifier()` to observe
/// events.
pub struct WorkflowExecutor<N: ExecutionNotifier = NoopNotifier> {
  store: Arc<dyn Store>,
  capabilities: Capabilities,
  notifier: N,
}

impl WorkflowExecutor<NoopNotifier> {
  /// Create a new executor with no-op notifications.
  pub fn new(store: Arc<dyn Store>, capabilities: Capabilities) -> Self {
    Self::with_notifier(store, capabilities, NoopNotifier)
  }
}

impl<N: ExecutionNotifier> WorkflowExecutor<N> {
  /// Create a new executor with a custom notifier.
  pub fn with_notifier(store: Arc<dyn Store>, capabilities: Capabilities, notifier: N) -> Self {
    Self {
      store,
      capabilities,
      notifier,
    }
  }

  /// Execute a workflow with the given trigger data.
  ///
  /// Definition errors (inactive workflow, no start node) return `Err`
  /// before any history row is written. Node failures do not: they finalize
  /// the execution as `failed` and return it as `Ok`, with the failing
  /// node's error as the execution's `error_message`.
  #[instrument(
    name = "workflow_execute",
    skip(self, workflow, trigger_data),
    fields(
      workflow_id = %workflow.workflow_id,
    )
  )]
  pub async fn execute(
    &self,
    workflow: &Workflow,
    trigger_data: Value,
  ) -> Result<WorkflowExecution, ExecutionError> {
    if !workflow.is_active {
      return Err(ExecutionError::DefinitionInactive {
        workflow_id: workflow.workflow_id.clone(),
      });
    }

    // Locking validates this, but the executor re-checks in case it was
    // handed a definition that bypassed the store.
    let start_nodes: Vec<String> = workflow.graph().start_nodes().to_vec();
    if start_nodes.is_empty() {
      return Err(ExecutionError::NoStartNode {
        workflow_id: workflow.workflow_id.clone(),
      });
    }

    let execution_id = uuid::Uuid::new_v4().to_string();
    let started_at = Utc::now();
    let mut execution = WorkflowExecution {
      execution_id: execution_id.clone(),
      workflow_id: workflow.workflow_id.clone(),
      organization_id: workflow.organization_id.clone(),
      status: ExecutionStatus::Running,
      trigger_data: Json(trigger_data.clone()),
      started_at,
      completed_at: None,
      execution_time_ms: None,
      error_message: None,
    };
    self.store.create_execution(&execution).await?;

    info!(
      execution_id = %execution_id,
      workflow_id = %workflow.workflow_id,
      trigger_data = %trigger_data,
      "workflow_started"
    );
    self.notifier.notify(ExecutionEvent::ExecutionStarted {
      execution_id: execution_id.clone(),
      workflow_id: workflow.workflow_id.clone(),
    });

    let mut ctx = Context::from_trigger(&trigger_data);
    let mut visited: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<String> = start_nodes.into();

    while let Some(node_id) = queue.pop_front() {
      // The visited set guarantees each node runs at most once per
      // execution, even through diamonds or cycles.
      if !visited.insert(node_id.clone()) {
        continue;
      }

      let Some(node) = workflow.get_node(&node_id) else {
        warn!(execution_id = %execution_id, node_id = %node_id, "edge to unknown node, skipping");
        continue;
      };

      match self.run_one(&execution_id, &node_id, node, &ctx).await? {
        Ok(output) => {
          ctx.insert(&node_id, output);
          for next in workflow.graph().on_success(&node_id) {
            queue.push_back(next.clone());
          }
        }
        Err(message) => {
          // Fail fast: the data model reserves on_error edges as an
          // extension point, but the current node set aborts the whole
          // execution on first failure.
          execution.status = ExecutionStatus::Failed;
          execution.error_message = Some(message.clone());
          self.finalize(&mut execution, started_at).await?;

          error!(
            execution_id = %execution_id,
            node_id = %node_id,
            error = %message,
            "workflow_failed"
          );
          self.notifier.notify(ExecutionEvent::ExecutionFailed {
            execution_id: execution_id.clone(),
            error: message,
          });
          return Ok(execution);
        }
      }
    }

    execution.status = ExecutionStatus::Success;
    self.finalize(&mut execution, started_at).await?;

    info!(execution_id = %execution_id, "workflow_completed");
    self.notifier.notify(ExecutionEvent::ExecutionCompleted {
      execution_id: execution_id.clone(),
    });
    Ok(execution)
  }

  /// Run a single node, recording its execution row.
  ///
  /// The outer `Result` carries store failures; the inner one is the node's
  /// own success or failure message.
  async fn run_one(
    &self,
    execution_id: &str,
    node_id: &str,
    node: &trellis_config::NodeDef,
    ctx: &Context,
  ) -> Result<Result<Value, String>, ExecutionError> {
    let started_at = Utc::now();
    let mut record = NodeExecution {
      node_execution_id: uuid::Uuid::new_v4().to_string(),
      execution_id: execution_id.to_string(),
      node_id: node_id.to_string(),
      node_type: node.config.kind().to_string(),
      status: NodeExecutionStatus::Running,
      input_data: Json(ctx.snapshot()),
      output_data: None,
      error_message: None,
      started_at,
      completed_at: None,
      execution_time_ms: None,
    };
    self.store.create_node_execution(&record).await?;

    info!(
      execution_id = %execution_id,
      node_id = %node_id,
      node_type = %record.node_type,
      "node_started"
    );
    self.notifier.notify(ExecutionEvent::NodeStarted {
      execution_id: execution_id.to_string(),
      node_id: node_id.to_string(),
    });

    let result = run_node(&node.config, ctx, &self.capabilities).await;

    let completed_at = Utc::now();
    record.completed_at = Some(completed_at);
    record.execution_time_ms = Some((completed_at - started_at).num_milliseconds());

    match result {
      Ok(output) => {
        record.status = NodeExecutionStatus::Success;
        record.output_data = Some(Json(output.clone()));
        self.store.update_node_execution(&record).await?;

        info!(
          execution_id = %execution_id,
          node_id = %node_id,
          output = %output,
          "node_completed"
        );
        self.notifier.notify(ExecutionEvent::NodeCompleted {
          execution_id: execution_id.to_string(),
          node_id: node_id.to_string(),
          output: output.clone(),
        });
        Ok(Ok(output))
      }
      Err(e) => {
        let message = e.to_string();
        record.status = NodeExecutionStatus::Failed;
        record.error_message = Some(message.clone());
        self.store.update_node_execution(&record).await?;

        error!(
          execution_id = %execution_id,
          node_id = %node_id,
          error = %message,
          "node_failed"
        );
        self.notifier.notify(ExecutionEvent::NodeFailed {
          execution_id: execution_id.to_string(),
          node_id: node_id.to_string(),
          error: message.clone(),
        });
        Ok(Err(message))
      }
    }
  }

  /// Write the terminal state of an execution.
  async fn finalize(
    &self,
    execution: &mut WorkflowExecution,
    started_at: DateTime<Utc>,
  ) -> Result<(), ExecutionError> {
    let completed_at = Utc::now();
    execution.completed_at = Some(completed_at);
    execution.execution_time_ms = Some((completed_at - started_at).num_milliseconds());
    self.store.update_execution(execution).await?;
    Ok(())
  }
}
