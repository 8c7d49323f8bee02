use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::{
        header::{CONTENT_LENGTH, CONTENT_TYPE},
        uri::PathAndQuery,
        HeaderMap, HeaderValue, Uri,
    },
    middleware::Next,
    response::Response,
};
use serde_json::Value;
use std::collections::HashMap;

use crate::config;
use crate::error::ApiError;
use crate::sanitizer::error::PayloadError;
use crate::sanitizer::{
    detect_operators, has_dangerous_characters, is_dangerous_key, is_sanitized, sanitize_key_name,
    sanitize_string, sanitize_value, Node, OperatorFinding,
};

/// Sanitizing pre-filter: buffers the request, strips forbidden keys and
/// values from JSON bodies (and query strings, when enabled), then forwards
/// the cleaned request. Non-JSON bodies pass through untouched.
pub async fn sanitize_request(request: Request, next: Next) -> Result<Response, ApiError> {
    let config = config::config();
    let (mut parts, body) = request.into_parts();

    if config.sanitizer.sanitize_query {
        if let Some(uri) = sanitize_uri(&parts.uri)? {
            parts.uri = uri;
        }
    }

    let limit = config.api.max_request_size_bytes;
    let bytes = to_bytes(body, limit)
        .await
        .map_err(|_| PayloadError::BodyTooLarge { limit })?;

    if is_json(&parts.headers) && !bytes.is_empty() {
        let payload: Value = serde_json::from_slice(&bytes).map_err(PayloadError::from)?;

        if config.sanitizer.audit_logging {
            audit(&detect_operators(&Node::from(payload.clone())));
        }

        let cleaned = sanitize_value(payload);
        let encoded = serde_json::to_vec(&cleaned).map_err(PayloadError::from)?;
        parts.headers.insert(CONTENT_LENGTH, HeaderValue::from(encoded.len()));

        let request = Request::from_parts(parts, Body::from(encoded));
        return Ok(next.run(request).await);
    }

    let request = Request::from_parts(parts, Body::from(bytes));
    Ok(next.run(request).await)
}

/// Hard-rejection pre-filter: instead of silently stripping, answers 400 when
/// the raw payload or query carries forbidden keys. The request is forwarded
/// unmodified when it validates.
pub async fn reject_unsanitized(request: Request, next: Next) -> Result<Response, ApiError> {
    let config = config::config();
    let (parts, body) = request.into_parts();

    if config.sanitizer.sanitize_query && has_dirty_query(&parts.uri) {
        return Err(ApiError::bad_request("Request query contains forbidden keys"));
    }

    let limit = config.api.max_request_size_bytes;
    let bytes = to_bytes(body, limit)
        .await
        .map_err(|_| PayloadError::BodyTooLarge { limit })?;

    if is_json(&parts.headers) && !bytes.is_empty() {
        let payload: Value = serde_json::from_slice(&bytes).map_err(PayloadError::from)?;
        let tree = Node::from(payload);

        if !is_sanitized(&tree) {
            let findings = detect_operators(&tree);
            if config.sanitizer.audit_logging {
                audit(&findings);
            }

            let field_errors: HashMap<String, String> = findings
                .iter()
                .map(|f| (f.path.clone(), "Query operators are not allowed".to_string()))
                .collect();
            return Err(ApiError::validation_error(
                "Request payload contains forbidden keys",
                if field_errors.is_empty() { None } else { Some(field_errors) },
            ));
        }
    }

    let request = Request::from_parts(parts, Body::from(bytes));
    Ok(next.run(request).await)
}

fn audit(findings: &[OperatorFinding]) {
    for finding in findings {
        tracing::warn!(
            operator = %finding.operator,
            path = %finding.path,
            "query operator detected in request payload"
        );
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase().contains("json"))
        .unwrap_or(false)
}

/// Apply the key rules to the query string. Returns a rebuilt URI when any
/// pair was dropped or rewritten, None when the query was already clean.
fn sanitize_uri(uri: &Uri) -> Result<Option<Uri>, PayloadError> {
    let query = match uri.query() {
        Some(q) if !q.is_empty() => q,
        _ => return Ok(None),
    };

    let mut cleaned = url::form_urlencoded::Serializer::new(String::new());
    let mut changed = false;
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        if is_dangerous_key(&key) || key.starts_with('$') {
            changed = true;
            continue;
        }
        let clean_value = sanitize_string(&value);
        if clean_value != value {
            changed = true;
        }
        if has_dangerous_characters(&key) {
            changed = true;
            cleaned.append_pair(&sanitize_key_name(&key), &clean_value);
        } else {
            cleaned.append_pair(&key, &clean_value);
        }
    }

    if !changed {
        return Ok(None);
    }

    let rebuilt = cleaned.finish();
    let path_and_query = if rebuilt.is_empty() {
        uri.path().to_string()
    } else {
        format!("{}?{}", uri.path(), rebuilt)
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(
        path_and_query
            .parse::<PathAndQuery>()
            .map_err(|e| PayloadError::QueryRebuild(e.to_string()))?,
    );
    Uri::from_parts(parts)
        .map(Some)
        .map_err(|e| PayloadError::QueryRebuild(e.to_string()))
}

fn has_dirty_query(uri: &Uri) -> bool {
    let query = match uri.query() {
        Some(q) if !q.is_empty() => q,
        _ => return false,
    };
    url::form_urlencoded::parse(query.as_bytes()).any(|(key, value)| {
        is_dangerous_key(&key)
            || key.starts_with('$')
            || has_dangerous_characters(&key)
            || value.contains('\0')
    })
}
