//! Trellis Workflow
//!
//! This crate provides the "locked" workflow representation for Trellis.
//! A locked workflow is a validated form of a workflow definition that is
//! ready for execution.
//!
//! Key differences from `trellis-config`:
//! - Node identifiers are guaranteed unique
//! - Every `on_success`/`on_error` edge targets an existing node
//! - Per-type config invariants hold (e.g. `update` has a `where` clause)
//! - Start nodes are identified, and there is at least one
//!
//! Mutating a stored definition never affects a locked workflow: each
//! execution captures its own snapshot at lock time.

mod error;
mod graph;
mod workflow;

pub use error::WorkflowError;
pub use graph::Graph;
pub use workflow::Workflow;
