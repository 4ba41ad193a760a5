//! Error types for workflow execution.

use thiserror::Error;
use trellis_capability::CapabilityError;
use trellis_store::StoreError;

/// Errors detected before or at the start of an execution.
///
/// Node-level failures are not represented here: they are recorded on the
/// node's execution row and surface as a terminal `failed`
/// `WorkflowExecution`, which `execute` still returns as `Ok`.
#[derive(Debug, Error)]
pub enum ExecutionError {
  /// The definition is inactive or soft-deleted.
  #[error("workflow '{workflow_id}' is not active")]
  DefinitionInactive { workflow_id: String },

  /// Every node has an incoming edge, so traversal cannot begin.
  ///
  /// Definition validation catches this at write time; the executor
  /// re-checks because it may be handed a definition from elsewhere.
  #[error("workflow '{workflow_id}' has no start nodes")]
  NoStartNode { workflow_id: String },

  /// Writing execution history failed.
  #[error(transparent)]
  Store(#[from] StoreError),
}

/// Failure of a single node handler.
#[derive(Debug, Error)]
pub enum NodeError {
  /// An external capability (mail, HTTP, database, notification) failed.
  #[error(transparent)]
  Capability(#[from] CapabilityError),

  /// The node's config is unusable at execution time.
  #[error("invalid node config: {0}")]
  InvalidConfig(String),
}
