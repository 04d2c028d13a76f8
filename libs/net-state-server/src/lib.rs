mod http;
mod ws;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use node_registry::{CommandRelay, NodeService};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("bind api {addr}: {source}")]
    Bind { addr: String, source: std::io::Error },

    #[error("axum serve: {0}")]
    Serve(std::io::Error),
}

#[derive(Clone)]
pub struct AppState {
    nodes: NodeService,
    relay: CommandRelay,
}

impl AppState {
    pub fn new(nodes: NodeService, relay: CommandRelay) -> Self {
        Self { nodes, relay }
    }
}

/// Маршруты viewer API:
/// - `GET /net-state`: snapshot всех узлов
/// - `DELETE /net-state`: сброс registry
/// - `GET /ws`: WebSocket канал команд для шины
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/net-state",
            get(http::handle_fetch_all).delete(http::handle_reset_all),
        )
        .route("/ws", get(ws::handle_ws))
        .with_state(state)
}

/// Открыть listener API. Ошибка bind'а возвращается сразу, до старта сервера.
pub async fn bind(addr: &str) -> Result<TcpListener, ApiError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ApiError::Bind { addr: addr.to_string(), source })
}

/// HTTP + WebSocket сервер для viewer'ов на открытом listener'е.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: CancellationToken,
) -> Result<(), ApiError> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(ApiError::Serve)
}
