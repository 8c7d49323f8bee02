use super::types::{Node, OperatorFinding, MAX_RECURSION_DEPTH};

/// Read-only walk reporting every `$`-prefixed mapping key in the tree, at any
/// depth, including inside arrays. Used for audit logging; the input is left
/// unmodified. The walk is bounded by the same depth constant as the
/// sanitizer, so content beyond the cap (which the sanitizer discards anyway)
/// is not reported.
pub fn detect_operators(node: &Node) -> Vec<OperatorFinding> {
    let mut findings = Vec::new();
    let mut path = Vec::new();
    walk(node, &mut path, &mut findings, 0);
    findings
}

fn walk(node: &Node, path: &mut Vec<String>, findings: &mut Vec<OperatorFinding>, depth: usize) {
    match node {
        Node::Array(items) => {
            if depth >= MAX_RECURSION_DEPTH {
                return;
            }
            for (index, item) in items.iter().enumerate() {
                path.push(index.to_string());
                walk(item, path, findings, depth + 1);
                path.pop();
            }
        }
        Node::Object(entries) => {
            if depth >= MAX_RECURSION_DEPTH {
                return;
            }
            for (key, value) in entries {
                path.push(key.clone());
                if key.starts_with('$') {
                    findings.push(OperatorFinding {
                        operator: key.clone(),
                        path: path.join("."),
                        value: value.clone(),
                    });
                }
                walk(value, path, findings, depth + 1);
                path.pop();
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_operator_reported_with_full_path() {
        let tree = Node::from(json!({"user": {"credentials": {"$where": "this.x"}}}));
        let findings = detect_operators(&tree);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].operator, "$where");
        assert_eq!(findings[0].path, "user.credentials.$where");
        assert_eq!(findings[0].value, Node::String("this.x".to_string()));
    }

    #[test]
    fn test_array_indices_appear_in_paths() {
        let tree = Node::from(json!({"items": [{"name": "a"}, {"$gt": 5}]}));
        let findings = detect_operators(&tree);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].path, "items.1.$gt");
    }

    #[test]
    fn test_top_level_operator_path_is_the_key_itself() {
        let tree = Node::from(json!({"$or": [{"a": 1}, {"b": 2}]}));
        let findings = detect_operators(&tree);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].path, "$or");
    }

    #[test]
    fn test_detection_leaves_input_unchanged() {
        let original = Node::from(json!({"password": {"$ne": null}}));
        let snapshot = original.clone();
        let _ = detect_operators(&original);
        assert_eq!(original, snapshot);
    }

    #[test]
    fn test_clean_tree_yields_no_findings() {
        let tree = Node::from(json!({"username": "admin", "tags": ["a", "b"]}));
        assert!(detect_operators(&tree).is_empty());
    }
}
