use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::ser::{Serialize, Serializer};
use serde_json::Value;

/// Maximum container nesting the sanitizer descends into. Containers found at
/// this depth are replaced by their empty counterpart instead of being walked,
/// so output trees are never deeper than this many levels.
pub const MAX_RECURSION_DEPTH: usize = 10;

/// Keys that are dropped outright wherever they appear in a mapping.
pub const DANGEROUS_KEYS: [&str; 3] = ["__proto__", "constructor", "prototype"];

/// A value undergoing sanitization. JSON payloads only ever produce the
/// `Null`/`Bool`/`Number`/`String`/`Array`/`Object` variants; the remaining
/// variants cover values the host framework may inject before the database
/// layer sees them.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Date(DateTime<Utc>),
    /// A live pattern object, held as its source text. Never compiled or
    /// executed here.
    Regex { source: String, flags: String },
    /// An opaque callable. Carries no payload and is never invoked.
    Function,
    Array(Vec<Node>),
    Object(BTreeMap<String, Node>),
}

impl Node {
    pub fn regex(source: impl Into<String>, flags: impl Into<String>) -> Self {
        Node::Regex {
            source: source.into(),
            flags: flags.into(),
        }
    }

    /// Text form a pattern collapses to: `/source/flags`.
    pub fn regex_literal(source: &str, flags: &str) -> String {
        format!("/{}/{}", source, flags)
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Node::Null,
            Value::Bool(b) => Node::Bool(b),
            Value::Number(n) => Node::Number(n),
            Value::String(s) => Node::String(s),
            Value::Array(items) => Node::Array(items.into_iter().map(Node::from).collect()),
            Value::Object(entries) => {
                Node::Object(entries.into_iter().map(|(k, v)| (k, Node::from(v))).collect())
            }
        }
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        match node {
            Node::Null => Value::Null,
            Node::Bool(b) => Value::Bool(b),
            Node::Number(n) => Value::Number(n),
            Node::String(s) => Value::String(s),
            Node::Date(ts) => Value::String(ts.to_rfc3339()),
            Node::Regex { source, flags } => Value::String(Node::regex_literal(&source, &flags)),
            Node::Function => Value::Null,
            Node::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            Node::Object(entries) => Value::Object(
                entries.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            ),
        }
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Null => serializer.serialize_unit(),
            Node::Bool(b) => serializer.serialize_bool(*b),
            Node::Number(n) => n.serialize(serializer),
            Node::String(s) => serializer.serialize_str(s),
            Node::Date(ts) => serializer.serialize_str(&ts.to_rfc3339()),
            Node::Regex { source, flags } => {
                serializer.serialize_str(&Node::regex_literal(source, flags))
            }
            Node::Function => serializer.serialize_unit(),
            Node::Array(items) => items.serialize(serializer),
            Node::Object(entries) => entries.serialize(serializer),
        }
    }
}

/// A detected query operator, reported for audit logging. The offending tree
/// itself is left untouched.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct OperatorFinding {
    pub operator: String,
    pub path: String,
    pub value: Node,
}
