//! HTTP server setup and the catch-all dispatch handler.
//!
//! # Responsibilities
//! - Build the axum app: catch-all dispatch route plus middleware layers
//! - Resolve each request to its owning module by context-path prefix
//! - Trigger lazy activation before the module's handlers see the request
//! - Forward requests into the module's mounted router or WebSocket handler
//! - Bind the listener and serve with graceful shutdown
//!
//! # Design Decisions
//! - The dispatch interceptor runs before any module-specific routes
//! - Unmatched paths are a 404 fallthrough, not an error
//! - Activation failure answers 500 on the triggering request only; the
//!   entry stays retry-able

use std::time::Duration;

use axum::{
    body::Body,
    extract::ws::WebSocketUpgrade,
    extract::{FromRequestParts, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceExt;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::dispatch::DispatcherContext;
use crate::errors::DispatchError;
use crate::http::request;
use crate::module::ServerKind;

/// Application state injected into the dispatch handler.
#[derive(Clone)]
struct AppState {
    ctx: DispatcherContext,
}

/// Build the axum app around the catch-all dispatch interceptor.
pub(crate) fn build_app(ctx: DispatcherContext) -> Router {
    let config = ctx.config().clone();
    Router::new()
        .route("/{*path}", any(dispatch_handler))
        .route("/", any(dispatch_handler))
        .with_state(AppState { ctx })
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(request::propagate_request_id())
        .layer(request::set_request_id())
        .layer(TraceLayer::new_for_http())
}

/// Serve the app on an already-bound listener until shutdown.
pub(crate) async fn serve(
    ctx: DispatcherContext,
    listener: TcpListener,
) -> Result<(), DispatchError> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "HTTP server starting");

    let app = build_app(ctx);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

/// Catch-all handler: resolve the owning module, activate it if needed,
/// then hand the request to the module's own handlers. The dispatcher never
/// formulates a response body for matched traffic itself.
async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let path = request.uri().path().to_string();

    let Some(entry) = state.ctx.registry().resolve(&path) else {
        tracing::debug!(path = %path, "No module claims path");
        return (StatusCode::NOT_FOUND, "no module registered for path").into_response();
    };

    if let Err(err) = state.ctx.ensure_activated(&entry).await {
        tracing::error!(
            context_path = %entry.context_path(),
            path = %path,
            error = %err,
            "Module activation failed"
        );
        return (StatusCode::INTERNAL_SERVER_ERROR, "module activation failed").into_response();
    }

    match entry.kind() {
        ServerKind::Primary => {
            let Some(router) = entry.routes() else {
                // Activated but mounted nothing; nothing downstream can
                // serve this path.
                tracing::debug!(
                    context_path = %entry.context_path(),
                    "Module mounted no routes"
                );
                return (StatusCode::NOT_FOUND, "no handler for path").into_response();
            };
            match router.oneshot(request).await {
                Ok(response) => response,
                Err(never) => match never {},
            }
        }
        ServerKind::Streaming => {
            let Some(handler) = state.ctx.hub().handler_for(entry.context_path()) else {
                tracing::debug!(
                    context_path = %entry.context_path(),
                    "Streaming module installed no connection handler"
                );
                return (StatusCode::NOT_FOUND, "no handler for path").into_response();
            };

            let (mut parts, _body) = request.into_parts();
            match WebSocketUpgrade::from_request_parts(&mut parts, &()).await {
                Ok(upgrade) => upgrade
                    .on_upgrade(move |socket| handler.on_connect(socket))
                    .into_response(),
                Err(_) => {
                    (StatusCode::UPGRADE_REQUIRED, "websocket upgrade required").into_response()
                }
            }
        }
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
