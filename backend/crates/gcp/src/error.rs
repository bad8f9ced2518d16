use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

#[derive(Debug, thiserror::Error)]
pub enum GoogleApiError {
    #[error("HTTP {status}: {body}")]
    HttpError { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("authentication failed: {0}")]
    Auth(String),
}

impl GoogleApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::HttpError { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

/// Decode a success body as `T`, or turn a non-2xx response into `HttpError`.
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, GoogleApiError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(GoogleApiError::RequestError);
    }

    let body = response.text().await.unwrap_or_default();
    Err(GoogleApiError::HttpError { status, body })
}
