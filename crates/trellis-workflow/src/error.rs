use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
  #[error("duplicate node id: {0}")]
  DuplicateNodeId(String),

  #[error("edge references unknown node: from={from}, to={to}")]
  InvalidEdge { from: String, to: String },

  #[error("no start nodes found (every node has an incoming edge)")]
  NoStartNode,

  #[error("invalid config for node '{node_id}': {message}")]
  InvalidNodeConfig { node_id: String, message: String },
}
