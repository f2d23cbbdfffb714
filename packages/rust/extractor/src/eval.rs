//! Evaluation of parsed schema literals against a capability registry.

use serde_json::{Map, Number, Value};

use crate::literal::Expr;
use crate::widgets::{CapabilityRegistry, RegistryError};

/// Errors raised while turning an [`Expr`] into a value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("number {0} cannot be represented")]
    NonFiniteNumber(f64),
    #[error("widget `{name}` failed")]
    Widget {
        name: String,
        #[source]
        source: RegistryError,
    },
}

/// Evaluate `expr`. `registry` is the only capability the literal can reach.
///
/// Later duplicate object keys overwrite earlier ones.
pub fn evaluate(expr: &Expr, registry: &dyn CapabilityRegistry) -> Result<Value, EvalError> {
    Ok(match expr {
        Expr::Null => Value::Null,
        Expr::Bool(b) => Value::Bool(*b),
        Expr::Int(n) => Value::Number((*n).into()),
        Expr::Float(f) => Value::Number(Number::from_f64(*f).ok_or(EvalError::NonFiniteNumber(*f))?),
        Expr::String(s) => Value::String(s.clone()),
        Expr::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| evaluate(item, registry))
                .collect::<Result<_, _>>()?,
        ),
        Expr::Object(members) => {
            let mut map = Map::new();
            for (key, value) in members {
                map.insert(key.clone(), evaluate(value, registry)?);
            }
            Value::Object(map)
        }
        Expr::Widget { name, args } => {
            let args = args
                .iter()
                .map(|arg| evaluate(arg, registry))
                .collect::<Result<Vec<_>, _>>()?;
            registry
                .invoke(name, &args)
                .map_err(|source| EvalError::Widget {
                    name: name.clone(),
                    source,
                })?
        }
    })
}

/// JavaScript-style name of a value's runtime type, for diagnostics.
pub fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::parse_literal;
    use crate::widgets::WidgetRegistry;
    use serde_json::json;

    fn eval(text: &str) -> Result<Value, EvalError> {
        let registry = WidgetRegistry::with_builtin_widgets();
        let expr = parse_literal(text, 32).expect("parse");
        evaluate(&expr, &registry)
    }

    #[test]
    fn evaluates_plain_data() {
        let value = eval("{ name: 'Posts', order: 2, ratio: 0.5, tags: ['a', null, false] }")
            .expect("eval");
        assert_eq!(
            value,
            json!({ "name": "Posts", "order": 2, "ratio": 0.5, "tags": ["a", null, false] })
        );
    }

    #[test]
    fn widget_calls_go_through_registry() {
        let value = eval("{ fields: { title: widgets.text({ label: 'Title' }), body: widgets.richText() } }")
            .expect("eval");
        assert_eq!(value["fields"]["title"], json!({ "widget": "text", "label": "Title" }));
        assert_eq!(value["fields"]["body"], json!({ "widget": "richText" }));
    }

    #[test]
    fn later_duplicate_keys_win() {
        assert_eq!(eval("{ a: 1, a: 2 }").expect("eval"), json!({ "a": 2 }));
    }

    #[test]
    fn widget_failures_carry_the_registry_error() {
        let err = eval("{ fields: { x: widgets.missing() } }").unwrap_err();
        assert_eq!(
            err,
            EvalError::Widget {
                name: "missing".into(),
                source: RegistryError::UnknownWidget("missing".into()),
            }
        );
    }

    #[test]
    fn infinite_numbers_are_rejected() {
        assert!(matches!(eval("1e999"), Err(EvalError::NonFiniteNumber(_))));
    }

    #[test]
    fn type_names_follow_javascript() {
        assert_eq!(value_type_name(&json!(null)), "null");
        assert_eq!(value_type_name(&json!([1])), "array");
        assert_eq!(value_type_name(&json!("s")), "string");
        assert_eq!(value_type_name(&json!({})), "object");
    }
}
