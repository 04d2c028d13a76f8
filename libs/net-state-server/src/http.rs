use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::AppState;

// ═══════════════════════════════════════════════════════════════
//  REST: GET /net-state
// ═══════════════════════════════════════════════════════════════

pub(crate) async fn handle_fetch_all(
    State(state): State<AppState>,
) -> impl IntoResponse {
    let nodes = state.nodes.fetch_all().await;
    axum::Json(nodes).into_response()
}

// ═══════════════════════════════════════════════════════════════
//  REST: DELETE /net-state
// ═══════════════════════════════════════════════════════════════

pub(crate) async fn handle_reset_all(
    State(state): State<AppState>,
) -> impl IntoResponse {
    state.nodes.reset_all().await;
    StatusCode::NO_CONTENT
}
