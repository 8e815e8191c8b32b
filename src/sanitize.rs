use axum::{
    body::{to_bytes, Body, Bytes},
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Fields exempt from sanitization: emails, usernames and passwords routinely
/// contain `@`, `$` or angle brackets and are never rendered as HTML.
/// Matched by bare key name at every nesting depth, not by path.
const EXEMPT_FIELDS: &[&str] = &["email", "username", "password"];

/// Adversarial-depth guard; decoded JSON is a tree, but not a shallow one.
const MAX_DEPTH: usize = 64;

/// Cap on the buffered JSON body. This middleware runs before the extractors,
/// so it must enforce its own limit rather than rely on theirs.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Middleware that rewrites JSON request bodies before they reach the
/// extractors. Non-JSON and unparsable bodies pass through untouched; the
/// downstream `Json` extractor owns the error report for the latter.
pub async fn sanitize_request_body(req: Request, next: Next) -> Response {
    let is_json = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/json"))
        .unwrap_or(false);
    if !is_json {
        return next.run(req).await;
    }

    let (parts, body) = req.into_parts();
    let bytes = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(b) => b,
        Err(e) => {
            warn!(error = %e, "request body exceeds the sanitizer limit");
            return (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(json!({ "message": "Request body too large" })),
            )
                .into_response();
        }
    };

    let bytes = match serde_json::from_slice::<Value>(&bytes) {
        Ok(mut value) => {
            sanitize_value(&mut value, 0);
            match serde_json::to_vec(&value) {
                Ok(v) => Bytes::from(v),
                Err(_) => bytes,
            }
        }
        Err(e) => {
            debug!(error = %e, "body is not valid json, skipping sanitization");
            bytes
        }
    };

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

/// Depth-first pass over a decoded JSON tree. Exempt keys skip their entire
/// subtree; every other string is cleaned in place.
pub fn sanitize_value(value: &mut Value, depth: usize) {
    if depth >= MAX_DEPTH {
        return;
    }
    match value {
        Value::String(s) => *s = clean_string(s),
        Value::Array(items) => {
            for item in items {
                sanitize_value(item, depth + 1);
            }
        }
        Value::Object(map) => {
            for (key, item) in map.iter_mut() {
                if EXEMPT_FIELDS.contains(&key.as_str()) {
                    continue;
                }
                sanitize_value(item, depth + 1);
            }
        }
        _ => {}
    }
}

/// `$` is stripped unconditionally (document-store operator injection); `<`
/// and `>` are entity-escaped only for values that look like plain text, not
/// like an email address or a URL.
fn clean_string(s: &str) -> String {
    let cleaned: String = s.chars().filter(|c| *c != '$').collect();
    if cleaned.contains('@') || cleaned.starts_with("http") {
        return cleaned;
    }
    cleaned.replace('<', "&lt;").replace('>', "&gt;")
}
