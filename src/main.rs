use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use mercado_api::{config, handlers, middleware, store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = config::config();
    tracing::info!("starting mercado-api in {:?} mode", config.environment);
    if config.security.access_secret.is_empty() || config.security.refresh_secret.is_empty() {
        tracing::warn!("JWT_SECRET / JWT_REFRESH_SECRET not set; token endpoints will fail");
    }

    let app = app();

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("mercado-api listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

fn app() -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        // Public token acquisition
        .merge(auth_routes())
        // Gated API surface
        .merge(api_routes())
        .merge(upload_routes())
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn auth_routes() -> Router {
    use handlers::auth;

    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/refresh", post(auth::refresh))
}

fn api_routes() -> Router {
    use handlers::{chat, records};

    Router::new()
        // Chat message boundary (document store)
        .route("/api/chat/mensajes", get(chat::list).post(chat::create))
        .route(
            "/api/chat/mensajes/:id",
            get(chat::get).put(chat::update).delete(chat::delete),
        )
        // Entity-generic operations (relational store)
        .route("/api/:entidad", get(records::list).post(records::create))
        .route("/api/:entidad/buscar", post(records::search))
        .route(
            "/api/:entidad/:id",
            get(records::get)
                .put(records::update)
                .patch(records::patch)
                .delete(records::delete),
        )
        .layer(axum_middleware::from_fn(middleware::require_auth))
}

fn upload_routes() -> Router {
    // Allow-listed size plus multipart framing overhead
    let body_limit = config::config().upload.max_bytes + 64 * 1024;

    Router::new()
        .route("/api/upload-img", post(handlers::upload::upload_img))
        .layer(axum_middleware::from_fn(middleware::upload_gate))
        .layer(DefaultBodyLimit::max(body_limit))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "name": "mercado-api",
        "version": version,
        "endpoints": {
            "auth": "/api/auth/login, /api/auth/refresh (public)",
            "entities": "/api/:entidad[/:id], /api/:entidad/buscar (protected)",
            "chat": "/api/chat/mensajes[/:id] (protected)",
            "upload": "/api/upload-img (protected, referer-conditional)",
        },
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match store::pool::ping().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok",
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "status": "degraded",
                "timestamp": now,
                "database_error": e.to_string(),
            })),
        ),
    }
}
