//! axum-based HTTP binding for the RPC surface.
//!
//! `POST /rpc/{procedure}` takes the procedure input as a JSON body and
//! answers `{"result": ...}` or `{"error": {...}}` with a status matching the
//! error code.

use axum::{
    Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::db::Database;
use crate::error::{ApiError, ErrorCode};
use crate::rpc::RpcHandler;

/// Server state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    rpc: RpcHandler,
}

impl AppState {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            rpc: RpcHandler::new(db),
        }
    }

    pub fn rpc(&self) -> &RpcHandler {
        &self.rpc
    }
}

/// Health check response.
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(json!({ "error": self }))).into_response()
    }
}

/// Dispatch one procedure call.
async fn rpc_call(
    State(state): State<AppState>,
    Path(procedure): Path<String>,
    body: Bytes,
) -> Response {
    let input: Value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        match serde_json::from_slice(&body) {
            Ok(value) => value,
            Err(e) => {
                return ApiError::new(ErrorCode::BadRequest, format!("Malformed JSON body: {}", e))
                    .into_response();
            }
        }
    };

    match state.rpc().call(&procedure, input) {
        Ok(result) => Json(json!({ "result": result })).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn api_root(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/api/health",
            "rpc": "/rpc/{procedure}",
        },
        "procedures": state.rpc().procedures(),
    }))
}

/// Build the router with all routes.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/rpc/{procedure}", post(rpc_call))
        .route("/api", get(api_root))
        .route("/api/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Handle for a running server.
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    join: JoinHandle<()>,
}

impl ServerHandle {
    /// Address the server is bound to.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL for clients of this server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Signal graceful shutdown and wait for in-flight requests to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Err(e) = self.join.await {
            tracing::error!("Server task ended abnormally: {}", e);
        }
    }
}

/// Start the HTTP server on `host:port`. Port 0 picks a free port.
pub async fn start_server(
    db: Arc<Database>,
    host: &str,
    port: u16,
) -> anyhow::Result<ServerHandle> {
    let app = build_router(AppState::new(db));

    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    let addr = listener.local_addr()?;

    info!("RPC server listening on http://{}", addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let join = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("RPC server shutting down");
            })
            .await
        {
            tracing::error!("RPC server error: {}", e);
        }
    });

    Ok(ServerHandle {
        addr,
        shutdown_tx: Some(shutdown_tx),
        join,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "healthy",
            version: "0.1.0",
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("0.1.0"));
    }

    #[test]
    fn test_api_error_status_mapping() {
        let response = ApiError::conflict("dup").into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = ApiError::task_not_found(1).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = ApiError::internal("boom").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
