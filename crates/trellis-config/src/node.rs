use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::enums::{ConditionOperator, DatabaseOperation};

/// A single node within a workflow definition.
///
/// Nodes are pure templates: they hold no runtime state and are instantiated
/// once per execution. String-valued config fields may contain
/// `{{dot.path}}` placeholders that are resolved against the execution's
/// variable context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
  pub node_id: String,
  #[serde(flatten)]
  pub config: NodeConfig,
  #[serde(default)]
  pub connections: Connections,
}

/// Downstream edges of a node.
///
/// `on_success` edges are followed after the node completes. `on_error` is
/// reserved for handlers that want an explicit failure branch; the current
/// executor aborts the execution on node failure instead of following it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Connections {
  #[serde(default)]
  pub on_success: Vec<String>,
  #[serde(default)]
  pub on_error: Vec<String>,
}

/// Type-specific node configuration.
///
/// A closed sum type over the six supported node kinds. The serialized form
/// uses an internal `type` tag, so definitions stored as JSON blobs stay
/// readable while unknown types fail to parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeConfig {
  Email {
    to: String,
    subject: String,
    body: String,
  },
  Webhook {
    url: String,
    method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    headers: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    body: Option<Value>,
  },
  Database {
    operation: DatabaseOperation,
    table: String,
    data: Map<String, Value>,
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    filter: Option<Map<String, Value>>,
  },
  Notification {
    title: String,
    message: String,
  },
  Condition {
    field: String,
    operator: ConditionOperator,
    value: Value,
  },
  Delay {
    /// Seconds to suspend this execution's continuation.
    duration: u64,
  },
}

impl NodeConfig {
  /// The stable kind name, as recorded on node execution history rows.
  pub fn kind(&self) -> &'static str {
    match self {
      NodeConfig::Email { .. } => "email",
      NodeConfig::Webhook { .. } => "webhook",
      NodeConfig::Database { .. } => "database",
      NodeConfig::Notification { .. } => "notification",
      NodeConfig::Condition { .. } => "condition",
      NodeConfig::Delay { .. } => "delay",
    }
  }
}
