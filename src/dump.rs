//! Bounded, human-readable rendering of structured record payloads.

use serde_json::Value;

/// Containers nested deeper than this are rendered as `[...]`.
pub const MAX_DEPTH: usize = 10;

const INDENT: &str = "    ";

/// Render `value` as an indented, deterministic dump.
///
/// Arrays and objects both use brackets, objects with `'key' => value`
/// pairs. Object keys keep the order of the underlying map. Owned
/// [`Value`] trees cannot form cycles, so only depth needs a bound.
pub fn dump(value: &Value) -> String {
    let mut out = String::new();
    dump_into(&mut out, value, 0);
    out
}

fn dump_into(out: &mut String, value: &Value, depth: usize) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => push_quoted(out, s),
        Value::Array(items) if items.is_empty() => out.push_str("[]"),
        Value::Object(fields) if fields.is_empty() => out.push_str("[]"),
        Value::Array(_) | Value::Object(_) if depth >= MAX_DEPTH => out.push_str("[...]"),
        Value::Array(items) => {
            out.push_str("[\n");
            for item in items {
                push_indent(out, depth + 1);
                dump_into(out, item, depth + 1);
                out.push_str(",\n");
            }
            push_indent(out, depth);
            out.push(']');
        }
        Value::Object(fields) => {
            out.push_str("[\n");
            for (key, item) in fields {
                push_indent(out, depth + 1);
                push_quoted(out, key);
                out.push_str(" => ");
                dump_into(out, item, depth + 1);
                out.push_str(",\n");
            }
            push_indent(out, depth);
            out.push(']');
        }
    }
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

fn push_quoted(out: &mut String, s: &str) {
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            c => out.push(c),
        }
    }
    out.push('\'');
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars() {
        assert_eq!(dump(&json!(null)), "null");
        assert_eq!(dump(&json!(true)), "true");
        assert_eq!(dump(&json!(42)), "42");
        assert_eq!(dump(&json!("it's")), "'it\\'s'");
        assert_eq!(dump(&json!([])), "[]");
        assert_eq!(dump(&json!({})), "[]");
    }

    #[test]
    fn nested_containers_are_indented() {
        let value = json!({"user": {"id": 7, "roles": ["admin"]}});
        assert_eq!(
            dump(&value),
            "[\n    'user' => [\n        'id' => 7,\n        'roles' => [\n            'admin',\n        ],\n    ],\n]"
        );
    }

    #[test]
    fn depth_is_capped() {
        let mut value = json!("leaf");
        for _ in 0..50 {
            value = json!([value]);
        }

        let out = dump(&value);
        assert!(out.contains("[...]"));
        assert!(!out.contains("leaf"));
        assert_eq!(out.matches("[\n").count(), MAX_DEPTH);
    }
}
