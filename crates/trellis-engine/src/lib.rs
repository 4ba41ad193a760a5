//! Trellis Engine
//!
//! The outward-facing surface of the workflow engine. It ties the store,
//! the validator, and the executor together:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      WorkflowRunner                         │
//! │  - owns mpsc channel (sender + receiver)                    │
//! │  - run(payload) triggers execution                          │
//! │  - start(cancel) runs the trigger loop                      │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     WorkflowService                         │
//! │  - definition CRUD with write-time validation               │
//! │  - trigger_workflow(org, id, payload) → WorkflowExecution   │
//! │  - execution history queries                                │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     WorkflowExecutor                        │
//! │  - graph traversal, node handlers, history records          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! `trigger_workflow` is synchronous: it blocks until the execution reaches
//! a terminal state and returns the terminal record. Callers that want
//! fire-and-forget semantics go through a [`WorkflowRunner`] channel.

mod error;
mod runner;
mod service;

pub use error::EngineError;
pub use runner::WorkflowRunner;
pub use service::WorkflowService;
