use super::keys::{has_dangerous_characters, is_dangerous_key};
use super::types::{Node, MAX_RECURSION_DEPTH};

/// Post-condition check: true iff sanitization would leave this tree
/// unchanged in every way that matters to the database layer. No dropped or
/// renamed keys anywhere, no pattern or callable values, and no non-empty
/// container past the depth limit. Callable directly on untrusted input to
/// reject a request outright instead of silently stripping it.
pub fn is_sanitized(node: &Node) -> bool {
    clean_at(node, 0)
}

fn clean_at(node: &Node, depth: usize) -> bool {
    match node {
        Node::Regex { .. } | Node::Function => false,
        Node::Array(items) => {
            if depth >= MAX_RECURSION_DEPTH && !items.is_empty() {
                return false;
            }
            items.iter().all(|item| clean_at(item, depth + 1))
        }
        Node::Object(entries) => {
            if depth >= MAX_RECURSION_DEPTH && !entries.is_empty() {
                return false;
            }
            entries.iter().all(|(key, value)| {
                !is_dangerous_key(key)
                    && !key.starts_with('$')
                    && !has_dangerous_characters(key)
                    && clean_at(value, depth + 1)
            })
        }
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clean_trees_validate() {
        for payload in [
            json!({"username": "admin", "age": 30}),
            json!({"_id": "507f1f77bcf86cd799439011", "tags": ["a", "b"]}),
            json!([{"name": "x"}, {"name": "y"}]),
            json!({}),
            json!(null),
        ] {
            assert!(is_sanitized(&Node::from(payload.clone())), "rejected {}", payload);
        }
    }

    #[test]
    fn test_dirty_trees_fail_validation() {
        for payload in [
            json!({"password": {"$ne": null}}),
            json!({"__proto__": {"isAdmin": true}}),
            json!({"user.password": "x"}),
            json!({"_version": 2}),
            json!({"items": [{"$where": "1"}]}),
        ] {
            assert!(!is_sanitized(&Node::from(payload.clone())), "accepted {}", payload);
        }
    }

    #[test]
    fn test_pattern_and_callable_values_fail_validation() {
        assert!(!is_sanitized(&Node::regex("a+", "i")));
        assert!(!is_sanitized(&Node::Function));
    }
}
