use axum::{
    middleware::from_fn,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use reqshield::config;
use reqshield::middleware::{reject_unsanitized, sanitize_request};
use reqshield::sanitizer::{detect_operators, is_sanitized, Node, MAX_RECURSION_DEPTH};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up APP_ENV, REQSHIELD_* overrides, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::info!("Starting reqshield in {:?} mode", config.environment);

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("REQSHIELD_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    println!("🚀 reqshield server listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app() -> Router {
    let config = config::config();

    // The guarded surface demonstrates both boundary policies: strip-and-forward
    // by default, hard rejection when configured.
    let guarded = if config.sanitizer.reject_on_violation {
        Router::new()
            .route("/v1/sanitize", post(sanitize_echo))
            .layer(from_fn(reject_unsanitized))
    } else {
        Router::new()
            .route("/v1/sanitize", post(sanitize_echo))
            .layer(from_fn(sanitize_request))
    };

    let mut app = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Audit surface, mounted outside the sanitizing layer on purpose
        .route("/v1/inspect", post(inspect))
        .merge(guarded);

    if config.api.enable_cors {
        app = app.layer(CorsLayer::permissive());
    }
    if config.api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }
    app
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "reqshield",
            "version": version,
            "description": "Recursive request-payload sanitization service built with Rust (Axum)",
            "max_recursion_depth": MAX_RECURSION_DEPTH,
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "sanitize": "POST /v1/sanitize (returns the hardened payload)",
                "inspect": "POST /v1/inspect (reports operator findings without cleaning)",
            }
        }
    }))
}

async fn health() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now()
        }
    }))
}

/// Runs behind the sanitizing layer, so the payload it sees is already clean.
async fn sanitize_echo(Json(payload): Json<Value>) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": payload
    }))
}

async fn inspect(Json(payload): Json<Value>) -> Json<Value> {
    let tree = Node::from(payload);
    let findings = detect_operators(&tree);

    Json(json!({
        "success": true,
        "data": {
            "sanitized": is_sanitized(&tree),
            "findings": findings
        }
    }))
}
