use crate::application::reconciler::CallbackOutcome;
use crate::domain::transaction::TransactionStatus;
use crate::error::ReconcileError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

pub const INTERNAL_ERROR_MESSAGE: &str = "Erreur interne";

/// Acknowledgement body returned to the gateway.
///
/// `{ "success": true, "status": "completed" }` or
/// `{ "success": false, "message": "..." }`.
#[derive(Debug, Serialize, PartialEq)]
pub struct CallbackResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TransactionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl IntoResponse for CallbackOutcome {
    fn into_response(self) -> Response {
        match self {
            CallbackOutcome::Acknowledged { status, .. } => (
                StatusCode::OK,
                Json(CallbackResponse {
                    success: true,
                    status: Some(status),
                    message: None,
                }),
            )
                .into_response(),
            CallbackOutcome::Rejected(rejection) => (
                StatusCode::BAD_REQUEST,
                Json(CallbackResponse {
                    success: false,
                    status: None,
                    message: Some(rejection.message().to_string()),
                }),
            )
                .into_response(),
        }
    }
}

/// Storage failure while handling a callback. Details are logged, not exposed.
pub struct ApiError(ReconcileError);

impl From<ReconcileError> for ApiError {
    fn from(err: ReconcileError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "callback handling failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(CallbackResponse {
                success: false,
                status: None,
                message: Some(INTERNAL_ERROR_MESSAGE.to_string()),
            }),
        )
            .into_response()
    }
}
