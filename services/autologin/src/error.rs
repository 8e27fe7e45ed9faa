use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Autologin service error variants (issuance path and infrastructure).
/// Verification denials travel as a `Verdict`, not as errors — they share one
/// uniform wire body regardless of cause.
#[derive(Debug, thiserror::Error)]
pub enum AutologinError {
    #[error("user not found")]
    UserNotFound,
    #[error("issuance refused by policy")]
    IssuanceRefused,
    #[error("code hash collision")]
    CodeCollision,
    #[error("store unavailable")]
    StoreUnavailable(#[source] anyhow::Error),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl AutologinError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::IssuanceRefused => "ISSUANCE_REFUSED",
            Self::CodeCollision => "CODE_COLLISION",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

impl IntoResponse for AutologinError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::IssuanceRefused => StatusCode::FORBIDDEN,
            Self::CodeCollision => StatusCode::INTERNAL_SERVER_ERROR,
            Self::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // 5xx carry the error chain into the logs; operators must be able to
        // tell an outage from attack noise. 4xx are expected client errors.
        match &self {
            Self::StoreUnavailable(e) | Self::Internal(e) => {
                tracing::error!(error = %e, kind = self.kind(), "autologin service error");
            }
            _ => {}
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
