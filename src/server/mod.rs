//! HTTP and websocket front of the game.
//!
//! Every page answers JSON. Authenticated routes read the session cookie;
//! avatars are served back from the upload directory under `/uploads`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tokio::{net::TcpListener, signal};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{debug, info, warn};

pub mod auth;
pub mod error;
pub mod routes;
pub mod state;
pub mod upload;
pub mod ws;

use crate::config::Settings;
pub use state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    let upload_limit = state.settings.server.max_upload_size_mb * 1024 * 1024;

    Router::new()
        .route("/", get(routes::dashboard))
        .route("/register", post(routes::register))
        .route("/login", post(routes::login))
        .route("/logout", get(routes::logout))
        .route("/click", post(routes::click))
        .route(
            "/upload_avatar",
            post(routes::upload_avatar).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/location", post(routes::submit_location))
        .route("/admin/locations", get(routes::admin_locations))
        .route("/chat", get(routes::chat_history))
        .route("/chat/ws", get(ws::chat_socket))
        .nest_service("/uploads", ServeDir::new(&state.settings.server.upload_dir))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.settings.server.cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .max_age(Duration::from_secs(60 * 60));

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}

pub async fn start_server(settings: Settings) -> anyhow::Result<()> {
    info!(
        "Initializing {} v{} ({:?})",
        settings.app.name, settings.app.version, settings.app.environment
    );
    tokio::fs::create_dir_all(&settings.server.upload_dir)
        .await
        .with_context(|| format!("creating upload dir {}", settings.server.upload_dir.display()))?;

    let state = AppState::from_settings(settings).await?;
    spawn_session_cleanup(state.clone());

    let app = build_router(state.clone());

    let address = state.settings.bind_address();
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

fn spawn_session_cleanup(state: Arc<AppState>) {
    let period = Duration::from_secs(state.settings.session.cleanup_interval_seconds.max(1));

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let removed = state.sessions.cleanup_expired();
            if removed > 0 {
                debug!("Purged {} expired sessions", removed);
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
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
}
