use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use billflow_common::error::BillflowError;

pub struct ApiError(pub BillflowError);

impl From<BillflowError> for ApiError {
    fn from(err: BillflowError) -> Self {
        Self(err)
    }
}

/// Undecodable request bodies are caller errors like any other bad parameter.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(BillflowError::invalid("body", rejection.body_text()))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            BillflowError::RequiredParameter { .. } | BillflowError::InvalidParameter { .. } => {
                StatusCode::BAD_REQUEST
            }
            BillflowError::NotFound(_) => StatusCode::NOT_FOUND,
            BillflowError::Warehouse(_)
            | BillflowError::Orchestrator(_)
            | BillflowError::Upstream(_) => StatusCode::BAD_GATEWAY,
            BillflowError::Config(_) | BillflowError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.0.code(), error = %self.0, "request failed");
        }

        let body = serde_json::json!({
            "error": self.0.code(),
            "message": self.0.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
