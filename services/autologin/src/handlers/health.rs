use axum::extract::State;
use axum::http::StatusCode;

use crate::state::AppState;

/// Handler for `GET /healthz` — liveness.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Handler for `GET /readyz` — the service is not ready without its database.
pub async fn readyz(State(state): State<AppState>) -> StatusCode {
    match state.db.ping().await {
        Ok(()) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
