use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use console_view::config::DEFAULT_EVENT_NAME;
use console_view::{
    ConsoleRegistry, ElementId, HttpFetcher, Overrides, StaticFullscreen, WidgetHandle,
};
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::{info, warn};

const CONFIG_FILE: &str = "console-view.toml";
const DEFAULT_PORT: u16 = 8080;

// Security headers for HTML responses
const CSP: &str = "default-src 'self'; script-src 'self'; style-src 'self'; img-src 'self' data:; connect-src 'self'; base-uri 'self'; form-action 'self'";

fn security_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(CSP),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

#[derive(Debug, Deserialize)]
struct HostConfig {
    #[serde(default = "default_port")]
    port: u16,
    /// Base for relative polling endpoints.
    base_url: Option<String>,
    #[serde(default)]
    fullscreen: bool,
    #[serde(flatten)]
    console: Overrides,
}

#[derive(Clone)]
struct AppState {
    registry: ConsoleRegistry,
    root: ElementId,
    event_name: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config: HostConfig = Figment::new()
        .merge(Toml::file(CONFIG_FILE))
        .merge(Env::prefixed("CONSOLE_"))
        .merge(Env::raw().only(&["port"]))
        .extract()?;

    let fetcher = match &config.base_url {
        Some(base_url) => HttpFetcher::with_base_url(base_url)?,
        None => HttpFetcher::new(),
    };
    let registry = ConsoleRegistry::new(
        Arc::new(fetcher),
        Arc::new(StaticFullscreen(config.fullscreen)),
    );

    let event_name = config
        .console
        .event_name
        .clone()
        .unwrap_or_else(|| DEFAULT_EVENT_NAME.to_string());
    let root = registry.create_element("div").await;
    let handle = registry.attach(root, config.console).await?;

    let state = AppState {
        registry: registry.clone(),
        root,
        event_name,
    };

    let app = Router::new()
        .route("/", get(get_console))
        .route("/messages", post(post_messages))
        .route("/fullscreen", post(toggle_fullscreen))
        .route("/status", get(get_status))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache"),
        ))
        .route("/liveness_check", get(health_check))
        .route("/readiness_check", get(health_check))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers([header::CONTENT_TYPE]),
        )
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown_widget(&registry, handle).await;
    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_widget(registry: &ConsoleRegistry, handle: WidgetHandle) {
    if let Err(e) = registry.detach(handle).await {
        warn!("Console widget stopped with an error: {}", e);
    }
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}

async fn health_check() -> &'static str {
    "OK"
}

async fn get_console(State(state): State<AppState>) -> impl IntoResponse {
    let body = state.registry.document().await.outer_html(state.root);
    let page = format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>console</title></head><body>{}</body></html>",
        body
    );
    (security_headers(), Html(page))
}

async fn post_messages(State(state): State<AppState>, body: String) -> StatusCode {
    let lines: Vec<&str> = body.split('\n').filter(|line| !line.is_empty()).collect();

    if lines.is_empty() {
        return StatusCode::BAD_REQUEST;
    }

    info!("Dispatching {} messages", lines.len());

    for line in lines {
        if !state
            .registry
            .dispatch(state.root, &state.event_name, line)
            .await
        {
            warn!("Console is not listening for {} events", state.event_name);
            return StatusCode::CONFLICT;
        }
    }

    StatusCode::NO_CONTENT
}

async fn toggle_fullscreen(State(state): State<AppState>) -> StatusCode {
    let control = state
        .registry
        .document()
        .await
        .find_by_class(state.root, "fullscreen")
        .first()
        .copied();

    match control {
        Some(control) if state.registry.click(control).await => StatusCode::NO_CONTENT,
        _ => StatusCode::NOT_FOUND,
    }
}

async fn get_status(State(state): State<AppState>) -> Response {
    let Some(status) = state.registry.status(state.root).await else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match serde_json::to_string(&status) {
        Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(e) => {
            warn!("Failed to serialize status: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
