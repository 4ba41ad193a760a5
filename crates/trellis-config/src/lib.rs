//! Trellis Config
//!
//! This crate contains the serializable workflow definition types for Trellis.
//! A workflow definition describes a trigger plus a directed graph of typed
//! action nodes; these types represent that definition before it is validated
//! and locked by `trellis-workflow` for execution.
//!
//! Definitions can be loaded from:
//! - JSON files (via CLI with `trellis run workflow.json`)
//! - Database storage (as JSON blobs)
//!
//! All types here are pure data: no I/O, no validation beyond what serde
//! enforces structurally. Node configs are a closed tagged enum, so an unknown
//! node type is rejected at deserialization time rather than at execution time.

mod enums;
mod node;
mod workflow;

pub use enums::{ConditionOperator, DatabaseOperation, TriggerType};
pub use node::{Connections, NodeConfig, NodeDef};
pub use workflow::WorkflowDef;
