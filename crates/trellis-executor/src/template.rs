//! `{{dot.path}}` template resolution against the variable context.
//!
//! Resolution is deliberately lenient: a placeholder whose path is missing
//! from the context is left in the output verbatim rather than erroring.
//! Existing definitions rely on this to reference node outputs that are not
//! populated yet, so it must be preserved. There are no template errors.

use serde_json::Value;

use crate::context::Context;

/// Resolve every `{{dot.path}}` placeholder in `template`.
///
/// String values substitute verbatim; other JSON values substitute as
/// compact JSON (`200`, `true`, `{"a":1}`). Unknown paths pass through
/// unchanged, which makes resolution idempotent on fully-resolved strings.
pub fn resolve_str(template: &str, ctx: &Context) -> String {
  let mut output = String::with_capacity(template.len());
  let mut rest = template;

  while let Some(open) = rest.find("{{") {
    let Some(close) = rest[open + 2..].find("}}") else {
      break;
    };
    let close = open + 2 + close;

    output.push_str(&rest[..open]);
    let token = &rest[open..close + 2];
    let path = rest[open + 2..close].trim();

    match ctx.lookup(path) {
      Some(Value::String(s)) => output.push_str(s),
      Some(value) => output.push_str(&value.to_string()),
      // Unknown path (or empty braces): keep the token as-is.
      None => output.push_str(token),
    }

    rest = &rest[close + 2..];
  }

  output.push_str(rest);
  output
}

/// Resolve templates recursively through a JSON value, leaf by leaf.
///
/// Strings are resolved; arrays and objects recurse; all other leaves pass
/// through unchanged. Used for webhook headers/bodies and database
/// data/where maps, which may nest placeholders arbitrarily deep.
pub fn resolve_value(value: &Value, ctx: &Context) -> Value {
  match value {
    Value::String(s) => Value::String(resolve_str(s, ctx)),
    Value::Array(items) => Value::Array(items.iter().map(|v| resolve_value(v, ctx)).collect()),
    Value::Object(map) => Value::Object(
      map
        .iter()
        .map(|(k, v)| (k.clone(), resolve_value(v, ctx)))
        .collect(),
    ),
    other => other.clone(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn ctx() -> Context {
    Context::from_trigger(&json!({
      "id": "42",
      "employee": { "name": "Ada" },
      "count": 3,
      "approved": true
    }))
  }

  #[test]
  fn test_substitutes_string_values() {
    assert_eq!(
      resolve_str("Hello {{employee.name}}!", &ctx()),
      "Hello Ada!"
    );
  }

  #[test]
  fn test_substitutes_non_string_values_as_json() {
    assert_eq!(resolve_str("count={{count}}", &ctx()), "count=3");
    assert_eq!(resolve_str("ok={{approved}}", &ctx()), "ok=true");
  }

  #[test]
  fn test_unknown_path_passes_through() {
    assert_eq!(
      resolve_str("{{missing.path}}", &Context::default()),
      "{{missing.path}}"
    );
  }

  #[test]
  fn test_partial_resolution_keeps_unknown_tokens() {
    assert_eq!(
      resolve_str("{{id}}-{{later.output}}", &ctx()),
      "42-{{later.output}}"
    );
  }

  #[test]
  fn test_idempotent_once_fully_resolved() {
    let once = resolve_str("https://x/{{trigger.id}}", &ctx());
    assert_eq!(once, "https://x/42");
    assert_eq!(resolve_str(&once, &ctx()), once);
  }

  #[test]
  fn test_whitespace_inside_braces_is_tolerated() {
    assert_eq!(resolve_str("{{ employee.name }}", &ctx()), "Ada");
  }

  #[test]
  fn test_unterminated_braces_are_left_alone() {
    assert_eq!(resolve_str("oops {{id", &ctx()), "oops {{id");
  }

  #[test]
  fn test_resolve_value_recurses_through_nested_json() {
    let body = json!({
      "employee": "{{employee.name}}",
      "tags": ["{{id}}", 7],
      "nested": { "note": "count is {{count}}" },
      "raw": 1.5
    });

    let resolved = resolve_value(&body, &ctx());
    assert_eq!(
      resolved,
      json!({
        "employee": "Ada",
        "tags": ["42", 7],
        "nested": { "note": "count is 3" },
        "raw": 1.5
      })
    );
  }
}
