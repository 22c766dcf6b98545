//! HTTP server exposing `/metrics` and `/healthz`.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::collector::{Collector, ProcessSource, TcpTableSource};
use crate::exporter::{render, validate_namespace};

struct AppState<P: ProcessSource, T: TcpTableSource> {
    collector: Arc<Collector<P, T>>,
    namespace: Option<String>,
}

impl<P: ProcessSource, T: TcpTableSource> Clone for AppState<P, T> {
    fn clone(&self) -> Self {
        Self {
            collector: Arc::clone(&self.collector),
            namespace: self.namespace.clone(),
        }
    }
}

/// Builds the exporter routes around a shared collector.
pub fn router<P, T>(collector: Arc<Collector<P, T>>, namespace: Option<String>) -> Router
where
    P: ProcessSource + 'static,
    T: TcpTableSource + 'static,
{
    Router::new()
        .route("/metrics", get(metrics_handler::<P, T>))
        .route("/healthz", get(healthz_handler))
        .with_state(AppState {
            collector,
            namespace,
        })
}

/// Binds `listen` and serves until SIGINT or SIGTERM.
pub async fn serve<P, T>(
    listen: SocketAddr,
    collector: Collector<P, T>,
    namespace: Option<String>,
) -> io::Result<()>
where
    P: ProcessSource + 'static,
    T: TcpTableSource + 'static,
{
    if let Some(ns) = namespace.as_deref() {
        validate_namespace(ns)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
    }
    let app = router(Arc::new(collector), namespace);

    let listener = TcpListener::bind(listen).await?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn metrics_handler<P, T>(State(state): State<AppState<P, T>>) -> impl IntoResponse
where
    P: ProcessSource + 'static,
    T: TcpTableSource + 'static,
{
    let collector = Arc::clone(&state.collector);
    // Sampling reads /proc synchronously.
    let records = match tokio::task::spawn_blocking(move || collector.collect()).await {
        Ok(records) => records,
        Err(e) => {
            error!(error = %e, "sample task failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain")],
                "sample failed".to_string(),
            );
        }
    };

    match render(&records, state.namespace.as_deref()) {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            text,
        ),
        Err(e) => {
            error!(error = %e, "encoding metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain")],
                "encoding error".to_string(),
            )
        }
    }
}

async fn healthz_handler() -> &'static str {
    "ok"
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutting down");
}
