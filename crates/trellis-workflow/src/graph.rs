use std::collections::HashMap;

use trellis_config::NodeDef;

/// Graph structure for traversal and analysis.
///
/// Built once when a definition is locked; the executor only reads it.
#[derive(Debug, Clone)]
pub struct Graph {
  /// node_id -> downstream node_ids along success edges.
  success: HashMap<String, Vec<String>>,
  /// node_id -> downstream node_ids along error edges (reserved).
  error: HashMap<String, Vec<String>>,
  /// node_id -> upstream node_ids (either edge kind).
  incoming: HashMap<String, Vec<String>>,
  /// Nodes with no incoming edges, in definition order.
  start_nodes: Vec<String>,
}

impl Graph {
  /// Build a graph from node definitions.
  pub fn new(nodes: &[NodeDef]) -> Self {
    let mut success: HashMap<String, Vec<String>> = HashMap::new();
    let mut error: HashMap<String, Vec<String>> = HashMap::new();
    let mut incoming: HashMap<String, Vec<String>> = HashMap::new();

    // Initialize all nodes
    for node in nodes {
      success.entry(node.node_id.clone()).or_default();
      error.entry(node.node_id.clone()).or_default();
      incoming.entry(node.node_id.clone()).or_default();
    }

    // Build adjacency lists from connections
    for node in nodes {
      for to in &node.connections.on_success {
        success
          .entry(node.node_id.clone())
          .or_default()
          .push(to.clone());
        incoming
          .entry(to.clone())
          .or_default()
          .push(node.node_id.clone());
      }
      for to in &node.connections.on_error {
        error
          .entry(node.node_id.clone())
          .or_default()
          .push(to.clone());
        incoming
          .entry(to.clone())
          .or_default()
          .push(node.node_id.clone());
      }
    }

    // Start nodes: no incoming edges, kept in definition order so traversal
    // is deterministic.
    let start_nodes: Vec<String> = nodes
      .iter()
      .map(|n| &n.node_id)
      .filter(|id| incoming.get(*id).is_none_or(|v| v.is_empty()))
      .cloned()
      .collect();

    Self {
      success,
      error,
      incoming,
      start_nodes,
    }
  }

  /// Nodes with no incoming edges, eligible to begin traversal.
  pub fn start_nodes(&self) -> &[String] {
    &self.start_nodes
  }

  /// Downstream nodes along success edges.
  pub fn on_success(&self, node_id: &str) -> &[String] {
    self
      .success
      .get(node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Downstream nodes along error edges.
  pub fn on_error(&self, node_id: &str) -> &[String] {
    self
      .error
      .get(node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Upstream nodes for a given node.
  pub fn incoming(&self, node_id: &str) -> &[String] {
    self
      .incoming
      .get(node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use trellis_config::{Connections, NodeConfig};

  fn node(id: &str, on_success: &[&str]) -> NodeDef {
    NodeDef {
      node_id: id.to_string(),
      config: NodeConfig::Delay { duration: 0 },
      connections: Connections {
        on_success: on_success.iter().map(|s| s.to_string()).collect(),
        on_error: vec![],
      },
    }
  }

  #[test]
  fn test_start_nodes_have_no_incoming_edges() {
    let nodes = vec![node("a", &["b"]), node("b", &["c"]), node("c", &[])];
    let graph = Graph::new(&nodes);

    assert_eq!(graph.start_nodes(), ["a".to_string()]);
    assert_eq!(graph.on_success("a"), ["b".to_string()]);
    assert_eq!(graph.incoming("c"), ["b".to_string()]);
  }

  #[test]
  fn test_diamond_has_single_start() {
    let nodes = vec![
      node("a", &["b", "c"]),
      node("b", &["d"]),
      node("c", &["d"]),
      node("d", &[]),
    ];
    let graph = Graph::new(&nodes);

    assert_eq!(graph.start_nodes(), ["a".to_string()]);
    assert_eq!(graph.incoming("d").len(), 2);
  }

  #[test]
  fn test_cycle_has_no_start_nodes() {
    let nodes = vec![node("a", &["b"]), node("b", &["a"])];
    let graph = Graph::new(&nodes);

    assert!(graph.start_nodes().is_empty());
  }

  #[test]
  fn test_error_edges_count_as_incoming() {
    let recover = node("recover", &[]);
    let mut risky = node("risky", &[]);
    risky.connections.on_error = vec!["recover".to_string()];

    let graph = Graph::new(&[risky, recover]);

    assert_eq!(graph.start_nodes(), ["risky".to_string()]);
    assert_eq!(graph.on_error("risky"), ["recover".to_string()]);
  }
}
