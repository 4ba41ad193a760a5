use serde::{Deserialize, Serialize};

/// How a workflow is invoked.
///
/// The engine is indifferent to the trigger kind beyond identifying *when* a
/// definition should be executed; callers (schedulers, event dispatchers,
/// admin UIs) own the actual invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
  Manual,
  Event,
  Schedule,
}

/// Comparison applied by a condition node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConditionOperator {
  Equals,
  NotEquals,
  GreaterThan,
  LessThan,
  Contains,
  Exists,
}

/// Mutation performed by a database node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseOperation {
  Insert,
  Update,
}
