use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};
use trellis_config::{DatabaseOperation, NodeConfig, NodeDef, TriggerType, WorkflowDef};

use crate::error::WorkflowError;
use crate::graph::Graph;

/// A locked workflow ready for execution.
///
/// Locking validates the structural invariants of a definition once, at write
/// time, so the executor can assume them. The locked form is an immutable
/// snapshot: later updates to the stored definition do not affect it.
#[derive(Debug, Clone)]
pub struct Workflow {
  pub workflow_id: String,
  pub organization_id: String,
  pub name: String,
  pub is_active: bool,
  pub trigger_type: TriggerType,
  pub trigger_config: Map<String, Value>,
  nodes: HashMap<String, NodeDef>,
  graph: Graph,
}

impl Workflow {
  /// Lock a definition, validating its structural invariants.
  ///
  /// Enforces:
  /// - node ids are unique within the definition
  /// - every `on_success`/`on_error` target references an existing node
  /// - at least one start node exists
  /// - each node's config satisfies its type's requirements
  pub fn lock(def: WorkflowDef) -> Result<Self, WorkflowError> {
    let node_ids: HashSet<&str> = def.nodes.iter().map(|n| n.node_id.as_str()).collect();
    if node_ids.len() != def.nodes.len() {
      let mut seen = HashSet::new();
      for node in &def.nodes {
        if !seen.insert(node.node_id.as_str()) {
          return Err(WorkflowError::DuplicateNodeId(node.node_id.clone()));
        }
      }
    }

    for node in &def.nodes {
      for to in node
        .connections
        .on_success
        .iter()
        .chain(&node.connections.on_error)
      {
        if !node_ids.contains(to.as_str()) {
          return Err(WorkflowError::InvalidEdge {
            from: node.node_id.clone(),
            to: to.clone(),
          });
        }
      }
      validate_config(node)?;
    }

    let graph = Graph::new(&def.nodes);
    if graph.start_nodes().is_empty() {
      return Err(WorkflowError::NoStartNode);
    }

    let nodes = def
      .nodes
      .into_iter()
      .map(|n| (n.node_id.clone(), n))
      .collect();

    Ok(Self {
      workflow_id: def.workflow_id,
      organization_id: def.organization_id,
      name: def.name,
      is_active: def.is_active,
      trigger_type: def.trigger_type,
      trigger_config: def.trigger_config,
      nodes,
      graph,
    })
  }

  /// Get a node by ID.
  pub fn get_node(&self, node_id: &str) -> Option<&NodeDef> {
    self.nodes.get(node_id)
  }

  /// The validated graph structure.
  pub fn graph(&self) -> &Graph {
    &self.graph
  }

  /// Number of nodes in the workflow.
  pub fn node_count(&self) -> usize {
    self.nodes.len()
  }
}

/// Per-type config requirements beyond what the type system enforces.
fn validate_config(node: &NodeDef) -> Result<(), WorkflowError> {
  let invalid = |message: &str| WorkflowError::InvalidNodeConfig {
    node_id: node.node_id.clone(),
    message: message.to_string(),
  };

  match &node.config {
    NodeConfig::Database {
      operation,
      table,
      data,
      filter,
    } => {
      if table.is_empty() {
        return Err(invalid("database node requires a table"));
      }
      // Identifiers are spliced into SQL text (only values are bound), so
      // they are restricted to names that cannot alter the statement.
      if !valid_identifier(table) {
        return Err(invalid(&format!("invalid table name '{}'", table)));
      }
      if data.is_empty() {
        return Err(invalid("database node requires non-empty data"));
      }
      for column in data.keys().chain(filter.iter().flat_map(|f| f.keys())) {
        if !valid_identifier(column) {
          return Err(invalid(&format!("invalid column name '{}'", column)));
        }
      }
      if *operation == DatabaseOperation::Update
        && filter.as_ref().is_none_or(|f| f.is_empty())
      {
        return Err(invalid("update operation requires a where clause"));
      }
      Ok(())
    }
    NodeConfig::Email { to, .. } => {
      if to.is_empty() {
        return Err(invalid("email node requires a recipient"));
      }
      Ok(())
    }
    NodeConfig::Webhook { url, method, .. } => {
      if url.is_empty() {
        return Err(invalid("webhook node requires a url"));
      }
      if method.is_empty() {
        return Err(invalid("webhook node requires a method"));
      }
      Ok(())
    }
    NodeConfig::Condition { field, .. } => {
      if field.is_empty() {
        return Err(invalid("condition node requires a field"));
      }
      Ok(())
    }
    NodeConfig::Notification { .. } | NodeConfig::Delay { .. } => Ok(()),
  }
}

fn valid_identifier(name: &str) -> bool {
  !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use trellis_config::Connections;

  fn def_with_nodes(nodes: Vec<NodeDef>) -> WorkflowDef {
    WorkflowDef {
      workflow_id: "wf-1".to_string(),
      organization_id: "org-1".to_string(),
      name: "Test".to_string(),
      description: None,
      is_active: true,
      trigger_type: TriggerType::Manual,
      trigger_config: Map::new(),
      nodes,
    }
  }

  fn delay(id: &str, on_success: &[&str]) -> NodeDef {
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
  fn test_lock_valid_chain() {
    let workflow = Workflow::lock(def_with_nodes(vec![
      delay("a", &["b"]),
      delay("b", &[]),
    ]))
    .unwrap();

    assert_eq!(workflow.node_count(), 2);
    assert_eq!(workflow.graph().start_nodes(), ["a".to_string()]);
  }

  #[test]
  fn test_duplicate_node_id_is_rejected() {
    let err = Workflow::lock(def_with_nodes(vec![delay("a", &[]), delay("a", &[])]))
      .unwrap_err();

    assert!(matches!(err, WorkflowError::DuplicateNodeId(id) if id == "a"));
  }

  #[test]
  fn test_edge_to_unknown_node_is_rejected() {
    let err = Workflow::lock(def_with_nodes(vec![delay("a", &["ghost"])])).unwrap_err();

    assert!(matches!(
      err,
      WorkflowError::InvalidEdge { from, to } if from == "a" && to == "ghost"
    ));
  }

  #[test]
  fn test_cycle_without_start_node_is_rejected() {
    let err = Workflow::lock(def_with_nodes(vec![
      delay("a", &["b"]),
      delay("b", &["a"]),
    ]))
    .unwrap_err();

    assert!(matches!(err, WorkflowError::NoStartNode));
  }

  #[test]
  fn test_update_without_where_is_rejected() {
    let node = NodeDef {
      node_id: "upd".to_string(),
      config: NodeConfig::Database {
        operation: DatabaseOperation::Update,
        table: "employees".to_string(),
        data: serde_json::from_value(json!({"status": "active"})).unwrap(),
        filter: None,
      },
      connections: Connections::default(),
    };

    let err = Workflow::lock(def_with_nodes(vec![node])).unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidNodeConfig { .. }));
  }

  #[test]
  fn test_database_identifiers_must_be_plain_names() {
    let with_table = |table: &str| NodeDef {
      node_id: "ins".to_string(),
      config: NodeConfig::Database {
        operation: DatabaseOperation::Insert,
        table: table.to_string(),
        data: serde_json::from_value(json!({"event": "hired"})).unwrap(),
        filter: None,
      },
      connections: Connections::default(),
    };

    let err = Workflow::lock(def_with_nodes(vec![with_table("audit_log; DROP TABLE users")]))
      .unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidNodeConfig { .. }));

    let bad_column = NodeDef {
      node_id: "ins".to_string(),
      config: NodeConfig::Database {
        operation: DatabaseOperation::Insert,
        table: "audit_log".to_string(),
        data: serde_json::from_value(json!({"event = 'x' --": "hired"})).unwrap(),
        filter: None,
      },
      connections: Connections::default(),
    };
    let err = Workflow::lock(def_with_nodes(vec![bad_column])).unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidNodeConfig { .. }));

    assert!(Workflow::lock(def_with_nodes(vec![with_table("audit_log")])).is_ok());
  }

  #[test]
  fn test_insert_without_where_is_accepted() {
    let node = NodeDef {
      node_id: "ins".to_string(),
      config: NodeConfig::Database {
        operation: DatabaseOperation::Insert,
        table: "audit_log".to_string(),
        data: serde_json::from_value(json!({"event": "hired"})).unwrap(),
        filter: None,
      },
      connections: Connections::default(),
    };

    assert!(Workflow::lock(def_with_nodes(vec![node])).is_ok());
  }
}
