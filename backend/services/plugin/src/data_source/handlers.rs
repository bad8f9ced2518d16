use axum::extract::State;
use axum::Json;
use billflow_common::error::BillflowError;

use crate::data_source::requests::{InitRequest, VerifyRequest};
use crate::data_source::responses::{InitResponse, PluginMetadata, VerifyResponse};
use crate::error::ApiError;
use crate::extractors::JsonBody;
use crate::AppState;

pub async fn init(JsonBody(body): JsonBody<InitRequest>) -> Json<InitResponse> {
    tracing::info!(provider = %body.options.provider, "data_source init");
    Json(InitResponse {
        metadata: PluginMetadata::cost_collector(),
    })
}

pub async fn verify(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<VerifyRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let domain_id = body
        .domain_id
        .as_deref()
        .filter(|d| !d.is_empty())
        .ok_or_else(|| BillflowError::required("domain_id"))?;

    tracing::info!(domain_id, provider = %body.options.provider, "data_source verify");

    let directory = state.backends.directory(&body.secret_data)?;
    directory.verify_plugin(domain_id).await?;
    Ok(Json(VerifyResponse {}))
}
