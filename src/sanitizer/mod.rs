pub mod detect;
pub mod error;
pub mod keys;
pub mod tree;
pub mod types;
pub mod validate;

pub use detect::detect_operators;
pub use keys::{has_dangerous_characters, is_dangerous_key, sanitize_key_name, sanitize_string};
pub use tree::{sanitize_data, sanitize_value};
pub use types::{Node, OperatorFinding, DANGEROUS_KEYS, MAX_RECURSION_DEPTH};
pub use validate::is_sanitized;
