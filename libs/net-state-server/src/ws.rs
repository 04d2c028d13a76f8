use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;

use super::AppState;

// ═══════════════════════════════════════════════════════════════
//  WebSocket: /ws
// ═══════════════════════════════════════════════════════════════

pub(crate) async fn handle_ws(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_connection(socket, state))
}

/// Каждый текстовый фрейм это команда для шины (publish / subscribe /
/// unsubscribe_all). Ошибочная команда логируется, клиенту уходит
/// `{"error": "..."}`, соединение остаётся открытым.
async fn ws_connection(mut socket: WebSocket, state: AppState) {
    tracing::debug!("viewer connected");

    while let Some(msg) = socket.recv().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(error = %e, "viewer socket error");
                break;
            }
        };

        let text = match msg {
            Message::Text(t) => t,
            Message::Close(_) => break,
            _ => continue,
        };

        match state.relay.handle_text(text.as_str()) {
            Ok(command) => tracing::debug!(command = ?command, "relayed viewer command"),
            Err(e) => {
                tracing::warn!(error = %e, "viewer command dropped");
                let reply = serde_json::json!({ "error": e.to_string() }).to_string();
                if socket.send(Message::Text(reply.into())).await.is_err() {
                    break;
                }
            }
        }
    }

    tracing::debug!("viewer disconnected");
}
