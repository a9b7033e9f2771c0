// JSON API over the ledger store.

mod extract;
mod handlers;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tracing::info;

use crate::application::LedgerStore;

pub use extract::*;
pub use handlers::*;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<LedgerStore>,
}

impl AppState {
    pub fn new(store: Arc<LedgerStore>) -> Self {
        Self { store }
    }
}

pub fn router(store: Arc<LedgerStore>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/doctors", get(list_doctors).post(create_doctor))
        .route(
            "/doctors/{id}",
            get(get_doctor).put(update_doctor).delete(delete_doctor),
        )
        .route(
            "/appointments",
            get(list_appointments).post(create_appointment),
        )
        .route("/report", get(report))
        .with_state(AppState::new(store))
}

/// Serve the API until the process is stopped.
pub async fn serve(store: Arc<LedgerStore>, addr: &str) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    serve_on(store, listener).await
}

/// Serve the API on an already bound listener.
pub async fn serve_on(store: Arc<LedgerStore>, listener: TcpListener) -> Result<()> {
    info!(addr = %listener.local_addr()?, "http server listening");
    axum::serve(listener, router(store))
        .await
        .context("HTTP server failed")?;
    Ok(())
}
