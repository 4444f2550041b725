use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::errors::AppError;
use crate::AppState;

pub mod email;
pub mod handlers;
pub mod reports;

/// The authenticated caller of a user-scoped route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub Uuid);

/// Build the full application router: health check, email endpoint and the
/// management API under `/api/v1`.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.dashboard_origin);

    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/api/send-gear-email", post(email::send_gear_email))
        .nest("/api/v1", api_router(state.clone()))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(middleware::from_fn(security_headers_middleware))
}

/// Management API. All routes are relative; the caller mounts this under `/api/v1`.
pub fn api_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let user_routes = Router::new()
        .route("/inbox", get(handlers::get_inbox))
        .route("/inbox/read-all", post(handlers::mark_all_read))
        .route(
            "/notifications/:id/read",
            post(handlers::mark_notification_read),
        )
        .route(
            "/announcements/:id/read",
            post(handlers::mark_announcement_read),
        )
        .route_layer(middleware::from_fn(user_auth));

    let admin_routes = Router::new()
        .route("/reports/usage", get(reports::get_usage_report))
        .route("/reports/usage.csv", get(reports::download_usage_csv))
        .route("/reports/usage.pdf", get(reports::download_usage_pdf))
        .route(
            "/admin/announcements",
            post(handlers::create_announcement),
        )
        .route(
            "/admin/notifications",
            post(handlers::create_notification),
        )
        .route_layer(middleware::from_fn_with_state(state, admin_auth));

    Router::new()
        .merge(user_routes)
        .merge(admin_routes)
        .fallback(fallback_404)
}

async fn fallback_404() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Middleware: resolves the caller from the `x-user-id` header.
async fn user_auth(mut req: Request, next: Next) -> Result<Response, AppError> {
    let user_id = req
        .headers()
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
        .ok_or_else(|| {
            tracing::warn!("user API: missing or malformed x-user-id header");
            AppError::Unauthorized
        })?;

    req.extensions_mut().insert(CurrentUser(user_id));
    Ok(next.run(req).await)
}

/// Middleware: validates `X-Admin-Key` header against the configured admin key.
/// Returns 401 if missing/invalid, 500 if no admin key is configured.
async fn admin_auth(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let provided_key = req
        .headers()
        .get("x-admin-key")
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            req.headers()
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(|t| t.trim())
        });

    let Some(expected) = state.config.admin_key.as_deref() else {
        tracing::error!("GEARHUB_ADMIN_KEY is not set");
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    };

    match provided_key {
        Some(k) if k == expected => Ok(next.run(req).await),
        Some(k) => {
            // Never log the expected key or the full provided key
            let masked = if k.len() > 8 {
                format!("{}…{}", &k[..4], &k[k.len() - 4..])
            } else {
                "****".to_string()
            };
            tracing::warn!("admin API: invalid key (provided: '{}')", masked);
            Err(StatusCode::UNAUTHORIZED)
        }
        None => {
            tracing::warn!("admin API: missing X-Admin-Key header");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

fn cors_layer(dashboard_origin: &str) -> CorsLayer {
    let dashboard_origin = dashboard_origin.to_string();
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin, _| {
            let origin_str = origin.to_str().unwrap_or("");
            origin_str == dashboard_origin
                || origin_str.starts_with("http://localhost:")
                || origin_str.starts_with("http://127.0.0.1:")
        }))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("authorization"),
            HeaderName::from_static("x-admin-key"),
            HeaderName::from_static("x-user-id"),
            HeaderName::from_static("x-request-id"),
        ])
        .allow_credentials(true)
}

/// Middleware: injects a unique X-Request-Id into every response.
async fn request_id_middleware(req: Request, next: Next) -> Response {
    let req_id = Uuid::new_v4().to_string();
    let mut resp = next.run(req).await;
    if let Ok(val) = HeaderValue::from_str(&req_id) {
        resp.headers_mut().insert("x-request-id", val);
    }
    resp
}

/// Middleware: injects security headers into every response.
async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut resp = next.run(req).await;
    let headers = resp.headers_mut();

    headers.insert(
        "X-Content-Type-Options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert("Referrer-Policy", HeaderValue::from_static("no-referrer"));
    // Inbox state and reports are per-user; never cache them
    headers.insert("Cache-Control", HeaderValue::from_static("no-store"));
    headers.remove("Server");

    resp
}
