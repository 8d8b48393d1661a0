use axum::{
    extract::{Json, Path, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::{
    env,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
};
use subtle::ConstantTimeEq;
use tokio::signal;
use tower_http::cors::{AllowOrigin, CorsLayer};

use candela_server::commands::{CommandBoundary, CommandQueue};
use candela_server::config::AppConfig;
use candela_server::models::InvokeResponse;
use candela_server::services::{init_logger, HeadlessHost, LogEventSink, LogManager};
use candela_server::state::CoreState;

// ============================================================================
// Constants
// ============================================================================

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8008;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:*,http://127.0.0.1:*";

// ============================================================================
// Application State
// ============================================================================

#[derive(Clone)]
struct AppState {
    queue: CommandQueue,
    auth_token: Option<String>,
}

// ============================================================================
// Security Utilities
// ============================================================================

/// Constant-time token comparison to prevent timing attacks
fn verify_token(expected: &str, provided: &str) -> bool {
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}

/// Extract bearer token from Authorization header
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Strip filesystem details from errors before they leave the process.
/// Command-level errors (unknown command, bad argument) pass through unchanged.
fn sanitize_error(error: &str) -> String {
    let lower = error.to_lowercase();

    if lower.contains("no such file") || lower.contains("os error 2") {
        return "Resource not found".to_string();
    }
    if lower.contains("permission denied") || lower.contains("access is denied") {
        return "Access denied".to_string();
    }
    if lower.contains("os error") {
        log::debug!("Sanitized error: {error}");
        return "Operation failed".to_string();
    }

    error.to_string()
}

// ============================================================================
// CORS Configuration
// ============================================================================

fn origin_allowed(allowed_origins: &[String], origin: &str) -> bool {
    allowed_origins.iter().any(|allowed| {
        if allowed.ends_with(":*") {
            // Wildcard port matching
            let prefix = allowed.trim_end_matches(":*");
            origin.starts_with(prefix) && origin[prefix.len()..].starts_with(':')
        } else {
            origin == allowed
        }
    })
}

fn build_cors_layer() -> CorsLayer {
    let cors_origins =
        env::var("CANDELA_CORS_ORIGINS").unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.to_string());

    let allowed_origins: Vec<String> = cors_origins
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin
                .to_str()
                .map(|origin| origin_allowed(&allowed_origins, origin))
                .unwrap_or(false)
        }))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// ============================================================================
// Request Handlers
// ============================================================================

async fn health() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

fn unauthorized_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(InvokeResponse::failure("Unauthorized")),
    )
        .into_response()
}

async fn invoke(
    Path(command): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Option<Json<Value>>,
) -> Response {
    if let Some(expected) = state.auth_token.as_deref() {
        let authenticated = bearer_token(&headers).is_some_and(|t| verify_token(expected, t));
        if !authenticated {
            return unauthorized_response();
        }
    }

    let payload = payload.map(|Json(value)| value).unwrap_or(Value::Null);
    let mut response = state.queue.invoke(&command, &payload).await;

    if response.ok {
        // `set-setting` reports its failure inside `data`.
        if let Some(Value::Object(data)) = response.data.as_mut() {
            if let Some(Value::String(error)) = data.get_mut("error") {
                *error = sanitize_error(error);
            }
        }
        (StatusCode::OK, Json(response)).into_response()
    } else {
        response.error = response.error.as_deref().map(sanitize_error);
        (StatusCode::BAD_REQUEST, Json(response)).into_response()
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/invoke/:command", post(invoke))
        .with_state(state)
        .layer(build_cors_layer())
}

// ============================================================================
// Server Lifecycle
// ============================================================================

fn parse_host(host: &str) -> IpAddr {
    host.parse().unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    log::info!("Shutdown signal received, stopping command worker...");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env();
    std::fs::create_dir_all(&config.data_dir)?;
    std::fs::create_dir_all(&config.image_cache_dir)?;

    let log_manager = Arc::new(LogManager::new(config.log_file.clone(), config.dev));
    init_logger(log_manager.clone())?;
    log_manager.write(format!(
        "Starting Candela core (data: {}, resources: {})",
        config.data_dir.display(),
        config.resources_dir.display()
    ));

    let host = env::var("CANDELA_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
    let port: u16 = env::var("CANDELA_PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let auth_token = env::var("CANDELA_API_TOKEN")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());

    let core = CoreState::load(&config, log_manager.clone());
    let boundary = CommandBoundary::new(core, Arc::new(HeadlessHost), Arc::new(LogEventSink));
    let (queue, worker) = CommandQueue::spawn(boundary)?;

    let state = AppState {
        queue: queue.clone(),
        auth_token,
    };

    let app = router(state.clone());

    let address = SocketAddr::new(parse_host(&host), port);
    log::info!("Candela backend listening on http://{address}");
    if state.auth_token.is_some() {
        log::info!("  Authentication: enabled");
    } else {
        log::info!("  Authentication: disabled (no token configured)");
    }

    let listener = tokio::net::TcpListener::bind(address).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Drain queued commands and persist pending settings before exiting.
    queue.shutdown();
    tokio::task::spawn_blocking(move || worker.join()).await?;
    log::info!("Command worker stopped, server shutting down");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use candela_server::commands::CommandWorker;
    use tempfile::{tempdir, TempDir};
    use tower::ServiceExt;

    /// Server state over a temp data dir whose settings file cannot be written
    fn blocked_state(temp: &TempDir, auth_token: Option<&str>) -> (AppState, CommandWorker) {
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let mut config = AppConfig::new(temp.path().join("data"), temp.path().join("resources"));
        config.settings_file = blocker.join("settings.json");
        let log = Arc::new(LogManager::new(config.log_file.clone(), false));
        let core = CoreState::load_with_host_locale(&config, log, Box::new(|| None::<String>));
        let boundary = CommandBoundary::new(core, Arc::new(HeadlessHost), Arc::new(LogEventSink));
        let (queue, worker) = CommandQueue::spawn(boundary).unwrap();

        let state = AppState {
            queue,
            auth_token: auth_token.map(String::from),
        };
        (state, worker)
    }

    fn invoke_request(command: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(format!("/api/invoke/{command}"))
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn shut_down(state: AppState, worker: CommandWorker) {
        state.queue.shutdown();
        worker.join();
    }

    #[tokio::test]
    async fn test_invoke_requires_bearer_token() {
        let temp = tempdir().unwrap();
        let (state, worker) = blocked_state(&temp, Some("secret"));
        let app = router(state.clone());

        let response = app
            .clone()
            .oneshot(invoke_request("get-platform", None, json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["ok"], json!(false));

        let response = app
            .clone()
            .oneshot(invoke_request("get-platform", Some("wrong"), json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(invoke_request("get-platform", Some("secret"), json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await["data"],
            json!(candela_server::commands::get_platform())
        );

        shut_down(state, worker);
    }

    #[tokio::test]
    async fn test_invoke_sanitizes_io_errors() {
        let temp = tempdir().unwrap();
        let (state, worker) = blocked_state(&temp, None);
        let app = router(state.clone());

        let response = app
            .oneshot(invoke_request(
                "set-setting",
                None,
                json!({ "key": "wallpaper", "value": "/img/a.png" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["data"]["success"], json!(false));
        let error = body["data"]["error"].as_str().unwrap();
        assert!(!error.contains("os error"));
        assert!(!error.contains(&*temp.path().to_string_lossy()));

        shut_down(state, worker);
    }

    #[tokio::test]
    async fn test_unknown_command_is_bad_request() {
        let temp = tempdir().unwrap();
        let (state, worker) = blocked_state(&temp, None);
        let app = router(state.clone());

        let response = app
            .oneshot(invoke_request("read-file", None, json!({ "path": "/etc/passwd" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"],
            json!("Unknown command: read-file")
        );

        shut_down(state, worker);
    }

    #[test]
    fn test_verify_token() {
        assert!(verify_token("secret", "secret"));
        assert!(!verify_token("secret", "secreT"));
        assert!(!verify_token("secret", ""));
    }

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer  abc "));
        assert_eq!(bearer_token(&headers), Some("abc"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_sanitize_error_hides_io_details() {
        assert_eq!(
            sanitize_error("Failed to access log file /home/me/x.log: No such file or directory (os error 2)"),
            "Resource not found"
        );
        assert_eq!(
            sanitize_error("Permission denied (os error 13)"),
            "Access denied"
        );
        assert_eq!(sanitize_error("Unknown command: foo"), "Unknown command: foo");
    }

    #[test]
    fn test_origin_allowed() {
        let allowed = vec!["http://localhost:*".to_string(), "tauri://localhost".to_string()];
        assert!(origin_allowed(&allowed, "http://localhost:5173"));
        assert!(origin_allowed(&allowed, "tauri://localhost"));
        assert!(!origin_allowed(&allowed, "http://localhost.evil.com"));
        assert!(!origin_allowed(&allowed, "https://example.com"));
    }
}
