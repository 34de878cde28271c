use crate::dispatcher::Dispatcher;
use anyhow::Result;
use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub command: String,
    pub username: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResponse {
    pub response: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub fn router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route("/command", post(handle_command))
        .route("/health", axum::routing::get(handle_health))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(dispatcher)
}

pub async fn start_server(bind: &str, dispatcher: Arc<Dispatcher>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("Listening on {}", bind);

    axum::serve(listener, router(dispatcher)).await?;

    Ok(())
}

async fn handle_command(
    State(dispatcher): State<Arc<Dispatcher>>,
    Json(payload): Json<CommandRequest>,
) -> Json<CommandResponse> {
    let response = dispatcher
        .handle(&payload.command, &payload.username, &payload.args)
        .await;
    Json(CommandResponse { response })
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
