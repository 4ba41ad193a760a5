//! Typed node handlers.
//!
//! One dispatch function per node kind. Each handler receives the node's
//! config and the live variable context, resolves templates in its
//! string-valued fields, performs its side effect through the capability
//! traits, and produces a JSON output that the executor merges into the
//! context under the node's id.

use serde_json::{Map, Value, json};
use trellis_capability::Capabilities;
use trellis_config::{ConditionOperator, DatabaseOperation, NodeConfig};

use crate::context::Context;
use crate::error::NodeError;
use crate::template::{resolve_str, resolve_value};

/// Dispatch a node to its handler.
pub(crate) async fn run_node(
  config: &NodeConfig,
  ctx: &Context,
  caps: &Capabilities,
) -> Result<Value, NodeError> {
  match config {
    NodeConfig::Email { to, subject, body } => run_email(to, subject, body, ctx, caps).await,
    NodeConfig::Webhook {
      url,
      method,
      headers,
      body,
    } => run_webhook(url, method, headers.as_ref(), body.as_ref(), ctx, caps).await,
    NodeConfig::Database {
      operation,
      table,
      data,
      filter,
    } => run_database(*operation, table, data, filter.as_ref(), ctx, caps).await,
    NodeConfig::Notification { title, message } => {
      run_notification(title, message, ctx, caps).await
    }
    NodeConfig::Condition {
      field,
      operator,
      value,
    } => run_condition(field, *operator, value, ctx),
    NodeConfig::Delay { duration } => run_delay(*duration).await,
  }
}

async fn run_email(
  to: &str,
  subject: &str,
  body: &str,
  ctx: &Context,
  caps: &Capabilities,
) -> Result<Value, NodeError> {
  let to = resolve_str(to, ctx);
  let subject = resolve_str(subject, ctx);
  let body = resolve_str(body, ctx);

  caps.mailer.send(&to, &subject, &body).await?;

  Ok(json!({ "sent": true, "to": to, "subject": subject }))
}

async fn run_webhook(
  url: &str,
  method: &str,
  headers: Option<&Map<String, Value>>,
  body: Option<&Value>,
  ctx: &Context,
  caps: &Capabilities,
) -> Result<Value, NodeError> {
  let url = resolve_str(url, ctx);
  let method = resolve_str(method, ctx);
  let headers: Map<String, Value> = headers
    .map(|h| {
      h.iter()
        .map(|(k, v)| (k.clone(), resolve_value(v, ctx)))
        .collect()
    })
    .unwrap_or_default();
  let body = body.map(|b| resolve_value(b, ctx));

  let response = caps
    .http
    .request(&method, &url, &headers, body.as_ref())
    .await?;

  Ok(json!({ "status": response.status, "data": response.data }))
}

async fn run_database(
  operation: DatabaseOperation,
  table: &str,
  data: &Map<String, Value>,
  filter: Option<&Map<String, Value>>,
  ctx: &Context,
  caps: &Capabilities,
) -> Result<Value, NodeError> {
  let data: Vec<(String, Value)> = data
    .iter()
    .map(|(k, v)| (k.clone(), resolve_value(v, ctx)))
    .collect();

  let (statement, params) = match operation {
    DatabaseOperation::Insert => build_insert(table, &data),
    DatabaseOperation::Update => {
      // Validation guarantees a where clause; re-check in case the
      // definition bypassed the store.
      let filter = filter.filter(|f| !f.is_empty()).ok_or_else(|| {
        NodeError::InvalidConfig("update operation requires a where clause".to_string())
      })?;
      let filter: Vec<(String, Value)> = filter
        .iter()
        .map(|(k, v)| (k.clone(), resolve_value(v, ctx)))
        .collect();
      build_update(table, &data, &filter)
    }
  };

  let rows_affected = caps.database.execute(&statement, &params).await?;

  Ok(json!({ "rows_affected": rows_affected }))
}

fn build_insert(table: &str, data: &[(String, Value)]) -> (String, Vec<Value>) {
  let columns: Vec<&str> = data.iter().map(|(k, _)| k.as_str()).collect();
  let placeholders: Vec<&str> = data.iter().map(|_| "?").collect();
  let statement = format!(
    "INSERT INTO {} ({}) VALUES ({})",
    table,
    columns.join(", "),
    placeholders.join(", ")
  );
  let params = data.iter().map(|(_, v)| v.clone()).collect();
  (statement, params)
}

fn build_update(
  table: &str,
  data: &[(String, Value)],
  filter: &[(String, Value)],
) -> (String, Vec<Value>) {
  let assignments: Vec<String> = data.iter().map(|(k, _)| format!("{} = ?", k)).collect();
  let conditions: Vec<String> = filter.iter().map(|(k, _)| format!("{} = ?", k)).collect();
  let statement = format!(
    "UPDATE {} SET {} WHERE {}",
    table,
    assignments.join(", "),
    conditions.join(" AND ")
  );
  let params = data
    .iter()
    .chain(filter)
    .map(|(_, v)| v.clone())
    .collect();
  (statement, params)
}

async fn run_notification(
  title: &str,
  message: &str,
  ctx: &Context,
  caps: &Capabilities,
) -> Result<Value, NodeError> {
  let title = resolve_str(title, ctx);
  let message = resolve_str(message, ctx);

  caps.notifier.notify(&title, &message).await?;

  Ok(json!({ "sent": true, "title": title, "message": message }))
}

/// Evaluate a condition against the context.
///
/// A false condition is still a successful node: the output records the
/// boolean and the looked-up value, and traversal continues along
/// `on_success`. Branching on the result is the definition author's wiring
/// concern, not an implicit behavior of this handler.
fn run_condition(
  field: &str,
  operator: ConditionOperator,
  expected: &Value,
  ctx: &Context,
) -> Result<Value, NodeError> {
  let actual = ctx.lookup(field);
  let result = match operator {
    ConditionOperator::Exists => actual.is_some_and(|v| !v.is_null()),
    ConditionOperator::Equals => actual.is_some_and(|v| values_equal(v, expected)),
    ConditionOperator::NotEquals => !actual.is_some_and(|v| values_equal(v, expected)),
    ConditionOperator::GreaterThan => {
      compare_numeric(actual, expected).is_some_and(|ord| ord == std::cmp::Ordering::Greater)
    }
    ConditionOperator::LessThan => {
      compare_numeric(actual, expected).is_some_and(|ord| ord == std::cmp::Ordering::Less)
    }
    ConditionOperator::Contains => actual.is_some_and(|v| value_contains(v, expected)),
  };

  Ok(json!({
    "condition": result,
    "field": field,
    "value": actual.cloned().unwrap_or(Value::Null),
  }))
}

/// Equality with numeric cross-type tolerance (`50 == 50.0`).
fn values_equal(actual: &Value, expected: &Value) -> bool {
  if let (Some(a), Some(b)) = (actual.as_f64(), expected.as_f64()) {
    return a == b;
  }
  actual == expected
}

fn compare_numeric(actual: Option<&Value>, expected: &Value) -> Option<std::cmp::Ordering> {
  let a = actual?.as_f64()?;
  let b = expected.as_f64()?;
  a.partial_cmp(&b)
}

fn value_contains(actual: &Value, expected: &Value) -> bool {
  match actual {
    Value::String(s) => match expected {
      Value::String(needle) => s.contains(needle),
      other => s.contains(&other.to_string()),
    },
    Value::Array(items) => items.iter().any(|item| values_equal(item, expected)),
    _ => false,
  }
}

async fn run_delay(duration: u64) -> Result<Value, NodeError> {
  // Cooperative wait: suspends only this execution's continuation, never
  // the runtime or other concurrent executions.
  tokio::time::sleep(std::time::Duration::from_secs(duration)).await;

  Ok(json!({ "delayed": duration }))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn ctx(value: Value) -> Context {
    Context::from_trigger(&value)
  }

  #[test]
  fn test_condition_greater_than_false_reports_actual_value() {
    let output = run_condition(
      "amount",
      ConditionOperator::GreaterThan,
      &json!(100),
      &ctx(json!({"amount": 50})),
    )
    .unwrap();

    assert_eq!(
      output,
      json!({"condition": false, "field": "amount", "value": 50})
    );
  }

  #[test]
  fn test_condition_equals_across_numeric_types() {
    let output = run_condition(
      "amount",
      ConditionOperator::Equals,
      &json!(50.0),
      &ctx(json!({"amount": 50})),
    )
    .unwrap();

    assert_eq!(output["condition"], json!(true));
  }

  #[test]
  fn test_condition_exists_on_missing_field() {
    let output = run_condition(
      "department",
      ConditionOperator::Exists,
      &Value::Null,
      &ctx(json!({})),
    )
    .unwrap();

    assert_eq!(output["condition"], json!(false));
    assert_eq!(output["value"], Value::Null);
  }

  #[test]
  fn test_condition_contains_string_and_array() {
    let context = ctx(json!({"title": "Senior Engineer", "tags": ["hr", "payroll"]}));

    let output =
      run_condition("title", ConditionOperator::Contains, &json!("Engineer"), &context).unwrap();
    assert_eq!(output["condition"], json!(true));

    let output =
      run_condition("tags", ConditionOperator::Contains, &json!("payroll"), &context).unwrap();
    assert_eq!(output["condition"], json!(true));

    let output =
      run_condition("tags", ConditionOperator::Contains, &json!("legal"), &context).unwrap();
    assert_eq!(output["condition"], json!(false));
  }

  #[test]
  fn test_condition_not_equals_on_missing_field_is_true() {
    let output = run_condition(
      "status",
      ConditionOperator::NotEquals,
      &json!("approved"),
      &ctx(json!({})),
    )
    .unwrap();

    assert_eq!(output["condition"], json!(true));
  }

  #[test]
  fn test_build_insert_statement() {
    let data = vec![
      ("event".to_string(), json!("hired")),
      ("name".to_string(), json!("Ada")),
    ];
    let (statement, params) = build_insert("audit_log", &data);

    assert_eq!(statement, "INSERT INTO audit_log (event, name) VALUES (?, ?)");
    assert_eq!(params, vec![json!("hired"), json!("Ada")]);
  }

  #[test]
  fn test_build_update_statement() {
    let data = vec![("status".to_string(), json!("approved"))];
    let filter = vec![("id".to_string(), json!("42"))];
    let (statement, params) = build_update("leave_requests", &data, &filter);

    assert_eq!(
      statement,
      "UPDATE leave_requests SET status = ? WHERE id = ?"
    );
    assert_eq!(params, vec![json!("approved"), json!("42")]);
  }
}
