//! The variable context shared by all nodes within one execution.

use serde_json::{Map, Value};

/// Mutable key -> value map seeded from trigger input and enriched with each
/// node's output.
///
/// The context is exclusively owned by one execution and never shared across
/// executions. Handlers receive it immutably; only the executor writes to it,
/// inserting each successful node's output under the node's id.
#[derive(Debug, Clone, Default)]
pub struct Context {
  values: Map<String, Value>,
}

impl Context {
  /// Seed a context from trigger data.
  ///
  /// Object payloads are copied in at the top level and additionally exposed
  /// under the `trigger` key, so templates can reference either
  /// `{{employee_id}}` or `{{trigger.employee_id}}`. Non-object payloads are
  /// only reachable via `trigger`.
  pub fn from_trigger(trigger_data: &Value) -> Self {
    let mut values = match trigger_data {
      Value::Object(map) => map.clone(),
      _ => Map::new(),
    };
    values.insert("trigger".to_string(), trigger_data.clone());
    Self { values }
  }

  /// Look up a value by dot path (`a.b.c`).
  pub fn lookup(&self, path: &str) -> Option<&Value> {
    let mut segments = path.split('.');
    let mut current = self.values.get(segments.next()?)?;
    for segment in segments {
      current = current.as_object()?.get(segment)?;
    }
    Some(current)
  }

  /// Record a node's output under its id.
  pub fn insert(&mut self, node_id: &str, output: Value) {
    self.values.insert(node_id.to_string(), output);
  }

  /// The full context as a JSON object (used for input snapshots).
  pub fn snapshot(&self) -> Value {
    Value::Object(self.values.clone())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_lookup_dot_path() {
    let ctx = Context::from_trigger(&json!({"employee": {"name": "Ada", "id": 7}}));

    assert_eq!(ctx.lookup("employee.name"), Some(&json!("Ada")));
    assert_eq!(ctx.lookup("trigger.employee.id"), Some(&json!(7)));
    assert_eq!(ctx.lookup("employee.missing"), None);
    assert_eq!(ctx.lookup("nope"), None);
  }

  #[test]
  fn test_non_object_trigger_lives_under_trigger_key() {
    let ctx = Context::from_trigger(&json!("plain"));

    assert_eq!(ctx.lookup("trigger"), Some(&json!("plain")));
  }

  #[test]
  fn test_insert_makes_output_addressable() {
    let mut ctx = Context::from_trigger(&json!({}));
    ctx.insert("webhook", json!({"status": 200}));

    assert_eq!(ctx.lookup("webhook.status"), Some(&json!(200)));
  }

  #[test]
  fn test_lookup_does_not_traverse_non_objects() {
    let ctx = Context::from_trigger(&json!({"amount": 50}));

    assert_eq!(ctx.lookup("amount"), Some(&json!(50)));
    assert_eq!(ctx.lookup("amount.value"), None);
  }
}
