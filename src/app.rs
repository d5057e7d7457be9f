use std::future::IntoFuture;
use std::time::Duration;

use anyhow::Context;
use axum::{extract::Request, routing::get, Router, ServiceExt};
use tokio::sync::oneshot;
use tower_http::{
    cors::CorsLayer, normalize_path::NormalizePath, timeout::TimeoutLayer, trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::state::AppState;
use crate::{health, users};

/// Full service stack. Trailing slashes are trimmed before routing, so
/// `/users/1/` and `/users/1` reach the same handler. A request still running
/// after `request_timeout` is answered with 408.
pub fn build_app(state: AppState, request_timeout: Duration) -> NormalizePath<Router> {
    let router = Router::new()
        .route("/", get(root))
        .merge(health::router())
        .merge(users::router())
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, ?latency, "response");
                        } else {
                            tracing::info!(%status, ?latency, "response");
                        }
                    },
                ),
        );
    NormalizePath::trim_trailing_slash(router)
}

async fn root() -> &'static str {
    "Hello!\n"
}

/// Serves until Ctrl-C/SIGTERM, then gives in-flight requests
/// `shutdown_timeout` to finish before dropping them.
pub async fn serve(app: NormalizePath<Router>, config: &AppConfig) -> anyhow::Result<()> {
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    tracing::info!("listening on {}", addr);

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(async move {
            let _ = stop_rx.await;
        });
    let mut server = tokio::spawn(server.into_future());

    tokio::select! {
        res = &mut server => {
            return res.context("server task")?.context("server error");
        }
        _ = shutdown_signal() => {}
    }

    let drain = config.http.shutdown_timeout;
    tracing::info!(?drain, "shutdown signal received, draining connections");
    let _ = stop_tx.send(());

    match tokio::time::timeout(drain, &mut server).await {
        Ok(res) => res.context("server task")?.context("server error")?,
        Err(_) => {
            tracing::warn!(?drain, "drain timeout elapsed, dropping open connections");
            server.abort();
        }
    }
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
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
