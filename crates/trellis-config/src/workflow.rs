use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::enums::TriggerType;
use crate::node::NodeDef;

/// A workflow definition: a trigger plus a graph of typed action nodes.
///
/// This is the stored, serializable form. It carries no audit columns (those
/// live on the persistence record) and is not guaranteed to be structurally
/// valid; `trellis-workflow` locks a definition into an executable `Workflow`
/// and reports validation errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDef {
  pub workflow_id: String,
  pub organization_id: String,
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default = "default_active")]
  pub is_active: bool,
  pub trigger_type: TriggerType,
  /// Trigger configuration is opaque to the engine (cron expression, event
  /// name, etc.); callers interpret it.
  #[serde(default)]
  pub trigger_config: Map<String, Value>,
  pub nodes: Vec<NodeDef>,
}

fn default_active() -> bool {
  true
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_is_active_defaults_to_true() {
    let def: WorkflowDef = serde_json::from_value(json!({
      "workflow_id": "wf-1",
      "organization_id": "org-1",
      "name": "Onboarding",
      "trigger_type": "event",
      "nodes": []
    }))
    .unwrap();

    assert!(def.is_active);
    assert!(def.trigger_config.is_empty());
  }
}
