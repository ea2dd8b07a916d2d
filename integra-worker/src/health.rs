//! Single-route health endpoint reporting broker connectivity.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tracing::info;

use integra_shared::messaging::BrokerClient;

pub fn router(broker: Arc<BrokerClient>) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(broker)
}

async fn health(
    State(broker): State<Arc<BrokerClient>>,
) -> (StatusCode, Json<serde_json::Value>) {
    if broker.is_connected().await {
        (StatusCode::OK, Json(json!({ "status": "ok" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "degraded", "broker": "disconnected" })),
        )
    }
}

/// Serves the health router until the process exits.
pub async fn serve(addr: String, broker: Arc<BrokerClient>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "health endpoint listening");
    axum::serve(listener, router(broker)).await
}
