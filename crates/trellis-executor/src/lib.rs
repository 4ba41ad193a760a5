//! Trellis Executor
//!
//! The workflow execution engine. Given a locked [`Workflow`] and a trigger
//! payload, the [`WorkflowExecutor`]:
//! - seeds a variable context from the trigger data
//! - walks the node graph from every start node, following success edges
//! - dispatches each node to its typed handler (email, webhook, database,
//!   notification, condition, delay)
//! - merges each node's output into the context under the node's id
//! - records one execution row and one node-execution row per node visited
//!
//! A per-execution visited set guarantees each node runs at most once, even
//! for diamonds or (pathological) cycles. The first node failure aborts the
//! execution: its error becomes the execution's `error_message` and no
//! further nodes run. Handler side effects already performed are not rolled
//! back; there is no compensation, retry, or cancellation of an in-flight
//! execution.
//!
//! [`Workflow`]: trellis_workflow::Workflow

mod context;
mod error;
mod events;
mod executor;
mod handler;
mod template;

pub use context::Context;
pub use error::{ExecutionError, NodeError};
pub use events::{ChannelNotifier, ExecutionEvent, ExecutionNotifier, NoopNotifier};
pub use executor::WorkflowExecutor;
pub use template::{resolve_str, resolve_value};
