use axum::{
    Router,
    http::HeaderName,
    routing::{get, post},
};
use tower_http::request_id::{MakeRequestId, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::handlers::{
    health::{healthz, readyz},
    token::{issue_token, verify_token},
};
use crate::state::AppState;

#[derive(Clone, Default)]
struct MakeUuidRequestId;

impl MakeRequestId for MakeUuidRequestId {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        Some(RequestId::new(id.parse().unwrap()))
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Autologin
        .route("/autologin/token", post(issue_token))
        .route("/autologin/verify", get(verify_token))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static("x-request-id"),
            MakeUuidRequestId,
        ))
        .with_state(state)
}
