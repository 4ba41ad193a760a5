//! Execution events and notifiers for observability.
//!
//! Events are emitted during workflow execution to allow consumers to observe
//! progress, stream to UIs, feed dashboards, etc. Durable history goes
//! through the store; events are best-effort.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Events emitted during workflow execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExecutionEvent {
  /// Workflow execution has started.
  ExecutionStarted {
    execution_id: String,
    workflow_id: String,
  },

  /// A node has started executing.
  NodeStarted {
    execution_id: String,
    node_id: String,
  },

  /// A node has completed successfully.
  NodeCompleted {
    execution_id: String,
    node_id: String,
    output: serde_json::Value,
  },

  /// A node has failed.
  NodeFailed {
    execution_id: String,
    node_id: String,
    error: String,
  },

  /// Workflow execution has completed successfully.
  ExecutionCompleted { execution_id: String },

  /// Workflow execution has failed.
  ExecutionFailed { execution_id: String, error: String },
}

/// Trait for receiving execution events.
///
/// The executor calls `notify` for each event - implementations decide what
/// to do with them (broadcast, log, ignore, etc.).
pub trait ExecutionNotifier: Send + Sync {
  /// Called when an execution event occurs.
  fn notify(&self, event: ExecutionEvent);
}

/// A no-op notifier that discards all events.
///
/// Useful for tests or when event observation is not needed.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl ExecutionNotifier for NoopNotifier {
  fn notify(&self, _event: ExecutionEvent) {
    // Intentionally empty
  }
}

/// A notifier that sends events to an unbounded channel.
///
/// Use this when you need to consume events asynchronously (e.g., stream to
/// a UI via websocket).
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  // NOTE: unbounded to avoid blocking the executor if the consumer is slow.
  // The event volume is low (a handful per node), so memory growth is
  // unlikely in practice.
  sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelNotifier {
  /// Create a new channel notifier.
  pub fn new(sender: mpsc::UnboundedSender<ExecutionEvent>) -> Self {
    Self { sender }
  }
}

impl ExecutionNotifier for ChannelNotifier {
  fn notify(&self, event: ExecutionEvent) {
    // Ignore send errors - receiver may have been dropped
    let _ = self.sender.send(event);
  }
}
