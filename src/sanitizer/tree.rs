use std::collections::BTreeMap;

use serde_json::Value;

use super::keys::{has_dangerous_characters, is_dangerous_key, sanitize_key_name, sanitize_string};
use super::types::{Node, MAX_RECURSION_DEPTH};

/// Produce a hardened copy of a value tree.
///
/// Mapping entries are dropped when the key is a prototype-chain key, an
/// underscore-prefixed key other than `_id`, or a `$`-prefixed query operator.
/// Keys containing merely dangerous characters are kept under a rewritten
/// name. String values lose null bytes, patterns collapse to their source
/// text, callables are removed, dates pass through untouched. The input is
/// never mutated; the output is a fresh tree.
pub fn sanitize_data(node: &Node) -> Node {
    sanitize_at(node, 0)
}

/// Convenience entry point for JSON payloads at the request boundary.
pub fn sanitize_value(value: Value) -> Value {
    Value::from(sanitize_data(&Node::from(value)))
}

fn sanitize_at(node: &Node, depth: usize) -> Node {
    match node {
        Node::Null => Node::Null,
        Node::Bool(b) => Node::Bool(*b),
        Node::Number(n) => Node::Number(n.clone()),
        Node::String(s) => Node::String(sanitize_string(s)),
        Node::Date(ts) => Node::Date(*ts),
        Node::Regex { source, flags } => Node::String(Node::regex_literal(source, flags)),
        // Container rules remove callables before recursion ever reaches one;
        // a bare top-level callable degrades to null.
        Node::Function => Node::Null,
        Node::Array(items) => {
            if depth >= MAX_RECURSION_DEPTH {
                return Node::Array(Vec::new());
            }
            // Dropped slots are compacted out rather than left as null
            // placeholders, so output length can shrink.
            let elements = items
                .iter()
                .filter(|item| !matches!(item, Node::Function))
                .map(|item| sanitize_at(item, depth + 1))
                .collect();
            Node::Array(elements)
        }
        Node::Object(entries) => {
            if depth >= MAX_RECURSION_DEPTH {
                return Node::Object(BTreeMap::new());
            }
            let mut out = BTreeMap::new();
            for (key, value) in entries {
                // Drop checks run before the rename check, so a key matching
                // both (e.g. "$__proto__") is dropped.
                if is_dangerous_key(key) || key.starts_with('$') {
                    continue;
                }
                if matches!(value, Node::Function) {
                    continue;
                }
                let resolved = if has_dangerous_characters(key) {
                    sanitize_key_name(key)
                } else {
                    key.clone()
                };
                out.insert(resolved, sanitize_at(value, depth + 1));
            }
            Node::Object(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn test_operator_values_are_stripped() {
        let cleaned = sanitize_value(json!({"username": "admin", "password": {"$ne": null}}));
        assert_eq!(cleaned, json!({"username": "admin", "password": {}}));
    }

    #[test]
    fn test_dotted_keys_are_rewritten() {
        let cleaned = sanitize_value(json!({"user.password": "leaked"}));
        assert_eq!(cleaned, json!({"user_password": "leaked"}));
    }

    #[test]
    fn test_null_bytes_stripped_from_values_and_keys() {
        assert_eq!(
            sanitize_value(json!({"username": "admin\u{0}"})),
            json!({"username": "admin"})
        );
        assert_eq!(
            sanitize_value(json!({"user\u{0}name": "admin"})),
            json!({"user_name": "admin"})
        );
    }

    #[test]
    fn test_prototype_chain_keys_dropped() {
        let cleaned = sanitize_value(json!({
            "__proto__": {"isAdmin": true},
            "constructor": "x",
            "prototype": {},
            "name": "test"
        }));
        assert_eq!(cleaned, json!({"name": "test"}));
    }

    #[test]
    fn test_underscore_keys_dropped_except_id() {
        let cleaned = sanitize_value(json!({
            "_id": "507f1f77bcf86cd799439011",
            "_version": 3,
            "_deleted": false,
            "name": "x"
        }));
        assert_eq!(cleaned, json!({"_id": "507f1f77bcf86cd799439011", "name": "x"}));
    }

    #[test]
    fn test_regex_collapses_to_source_text() {
        let mut entries = BTreeMap::new();
        entries.insert("pattern".to_string(), Node::regex("test", "gi"));
        let cleaned = sanitize_data(&Node::Object(entries));

        let mut expected = BTreeMap::new();
        expected.insert("pattern".to_string(), Node::String("/test/gi".to_string()));
        assert_eq!(cleaned, Node::Object(expected));
    }

    #[test]
    fn test_date_values_preserved() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let mut entries = BTreeMap::new();
        entries.insert("createdAt".to_string(), Node::Date(ts));
        let cleaned = sanitize_data(&Node::Object(entries));
        match cleaned {
            Node::Object(out) => assert_eq!(out.get("createdAt"), Some(&Node::Date(ts))),
            other => panic!("expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_callables_removed_from_mappings_and_arrays() {
        let mut entries = BTreeMap::new();
        entries.insert("callback".to_string(), Node::Function);
        entries.insert("name".to_string(), Node::String("x".to_string()));
        entries.insert(
            "items".to_string(),
            Node::Array(vec![
                Node::Bool(true),
                Node::Function,
                Node::String("kept".to_string()),
            ]),
        );
        let cleaned = sanitize_data(&Node::Object(entries));

        let mut expected = BTreeMap::new();
        expected.insert("name".to_string(), Node::String("x".to_string()));
        expected.insert(
            "items".to_string(),
            Node::Array(vec![Node::Bool(true), Node::String("kept".to_string())]),
        );
        assert_eq!(cleaned, Node::Object(expected));
    }

    #[test]
    fn test_array_elements_sanitized_in_order() {
        let cleaned = sanitize_value(json!([
            {"name": "item1"},
            {"name": "item2", "$where": "this.x"}
        ]));
        assert_eq!(cleaned, json!([{"name": "item1"}, {"name": "item2"}]));
    }

    #[test]
    fn test_empty_containers_pass_through() {
        assert_eq!(sanitize_value(json!({})), json!({}));
        assert_eq!(sanitize_value(json!([])), json!([]));
    }

    fn nested(levels: usize) -> Value {
        if levels == 0 {
            json!(true)
        } else {
            json!({ "child": nested(levels - 1) })
        }
    }

    // Depth in descents from the root: an empty container contributes none.
    fn descent_depth(value: &Value) -> usize {
        match value {
            Value::Array(items) => items.iter().map(descent_depth).max().map_or(0, |d| d + 1),
            Value::Object(entries) => {
                entries.values().map(descent_depth).max().map_or(0, |d| d + 1)
            }
            _ => 0,
        }
    }

    #[test]
    fn test_tree_at_depth_limit_survives_intact() {
        let tree = nested(MAX_RECURSION_DEPTH);
        assert_eq!(sanitize_value(tree.clone()), tree);
    }

    #[test]
    fn test_tree_beyond_depth_limit_is_truncated() {
        let tree = nested(MAX_RECURSION_DEPTH + 3);
        let cleaned = sanitize_value(tree.clone());
        assert_ne!(cleaned, tree);
        assert!(descent_depth(&cleaned) <= MAX_RECURSION_DEPTH);
    }
}
