use super::types::DANGEROUS_KEYS;

/// Characters replaced with `_` when a key is rewritten rather than dropped.
const REWRITTEN_CHARS: [char; 7] = ['$', '.', '\0', '<', '>', '/', '\\'];

/// Rewrite a mapping key into a safe replacement: each dangerous character
/// becomes `_`, runs of underscores collapse to one, and leading/trailing
/// underscores are stripped. Applying this twice yields the same result as
/// applying it once.
pub fn sanitize_key_name(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut last_was_underscore = false;
    for c in key.chars() {
        let mapped = if REWRITTEN_CHARS.contains(&c) { '_' } else { c };
        if mapped == '_' {
            if last_was_underscore {
                continue;
            }
            last_was_underscore = true;
        } else {
            last_was_underscore = false;
        }
        out.push(mapped);
    }
    out.trim_matches('_').to_string()
}

/// True if the key contains `$`, `.`, or a null byte. Path traversal
/// sequences (`../`, `..\`) are covered by the `.` check.
pub fn has_dangerous_characters(key: &str) -> bool {
    key.contains('$') || key.contains('.') || key.contains('\0')
}

/// Drop-rule predicate: prototype-chain keys, and any underscore-prefixed key
/// other than the document identifier `_id`. Keys matching this are removed
/// from mappings entirely, never renamed.
pub fn is_dangerous_key(key: &str) -> bool {
    if DANGEROUS_KEYS.contains(&key) {
        return true;
    }
    key.starts_with('_') && key != "_id"
}

/// Strip null bytes from a string value. All other content, including
/// multi-byte Unicode, passes through unchanged.
pub fn sanitize_string(value: &str) -> String {
    if value.contains('\0') {
        value.replace('\0', "")
    } else {
        value.to_string()
    }
}
