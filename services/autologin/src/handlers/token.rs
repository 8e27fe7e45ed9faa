use std::net::{IpAddr, SocketAddr};

use axum::{
    Json,
    extract::{ConnectInfo, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::domain::types::{DenyReason, Verdict};
use crate::error::AutologinError;
use crate::state::AppState;
use crate::usecase::issue::{AllowAll, IssueTokenInput, IssueTokenUseCase};
use crate::usecase::verify::{VerifyTokenInput, VerifyTokenUseCase};

/// Set by the upstream session layer when the inbound request already carries
/// an authenticated identity.
const X_AUTHENTICATED_USER: &str = "x-authenticated-user";

// ── POST /autologin/token ─────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct IssueTokenRequest {
    pub user_id: u64,
    pub ttl_seconds: Option<u64>,
}

#[derive(Serialize)]
pub struct IssueTokenResponse {
    pub token: String,
    pub expires_in: u64,
}

pub async fn issue_token(
    State(state): State<AppState>,
    Json(body): Json<IssueTokenRequest>,
) -> Result<impl IntoResponse, AutologinError> {
    let usecase = IssueTokenUseCase {
        codes: state.code_store(),
        users: state.user_directory(),
        policy: AllowAll,
        code_salt: state.code_salt.clone(),
        default_ttl_secs: state.default_ttl_secs,
    };

    let out = usecase
        .execute(IssueTokenInput {
            user_id: body.user_id,
            ttl_seconds: body.ttl_seconds,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(IssueTokenResponse {
            token: out.token,
            expires_in: out.expires_in,
        }),
    ))
}

// ── GET /autologin/verify ─────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct VerifyQuery {
    pub token: String,
}

#[derive(Serialize)]
pub struct VerifyResponse {
    pub user_id: u64,
}

pub async fn verify_token(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(query): Query<VerifyQuery>,
) -> Response {
    let usecase = VerifyTokenUseCase {
        codes: state.code_store(),
        limiter: state.attempt_limiter(),
        users: state.user_directory(),
        code_salt: state.code_salt.clone(),
    };

    let verdict = usecase
        .execute(VerifyTokenInput {
            raw_token: query.token,
            source_ip: source_ip(&headers, peer),
            current_user_id: authenticated_user(&headers),
        })
        .await;

    verdict_response(verdict)
}

fn verdict_response(verdict: Verdict) -> Response {
    match verdict {
        Verdict::Granted { user_id } => {
            (StatusCode::OK, Json(VerifyResponse { user_id })).into_response()
        }
        // Requires an authenticated session, so not an oracle worth hiding.
        Verdict::Denied {
            reason: DenyReason::AlreadyAuthenticated,
        } => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({
                "kind": "ALREADY_AUTHENTICATED",
                "message": "already authenticated",
            })),
        )
            .into_response(),
        // One body for everything else: the wire must not distinguish a wrong
        // code from a lockout or an outage. The reason stays in the logs.
        Verdict::Denied { reason } => {
            tracing::debug!(reason = reason.as_str(), "autologin denied");
            (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({
                    "kind": "LOGIN_DENIED",
                    "message": "login denied",
                })),
            )
                .into_response()
        }
    }
}

/// Client address for throttling: first `X-Forwarded-For` hop when present
/// (the service normally sits behind a proxy), otherwise the socket peer.
fn source_ip(headers: &HeaderMap, peer: SocketAddr) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse::<IpAddr>().ok())
        .or(Some(peer.ip()))
}

fn authenticated_user(headers: &HeaderMap) -> Option<u64> {
    headers.get(X_AUTHENTICATED_USER)?.to_str().ok()?.parse().ok()
}
