use thiserror::Error;
use trellis_executor::ExecutionError;
use trellis_store::StoreError;
use trellis_workflow::WorkflowError;

#[derive(Debug, Error)]
pub enum EngineError {
  /// The definition failed write-time validation.
  #[error("invalid workflow definition: {0}")]
  Validation(#[from] WorkflowError),

  /// The execution could not start.
  #[error(transparent)]
  Execution(#[from] ExecutionError),

  /// A storage operation failed.
  #[error(transparent)]
  Store(#[from] StoreError),

  /// The trigger channel is closed.
  #[error("workflow runner channel closed")]
  ChannelClosed,
}
