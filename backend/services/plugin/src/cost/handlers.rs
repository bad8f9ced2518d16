use axum::extract::State;
use axum::Json;
use billflow_common::error::BillflowError;
use billflow_config::DispatchMode;
use billflow_tasks::date_range;

use crate::cost::requests::{GetDataRequest, GetLinkedAccountsRequest};
use crate::cost::responses::{
    CollectorConf, GetDataResponse, GetLinkedAccountsResponse, LinkedAccountResponse,
};
use crate::error::ApiError;
use crate::extractors::JsonBody;
use crate::AppState;

pub async fn get_linked_accounts(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<GetLinkedAccountsRequest>,
) -> Result<Json<GetLinkedAccountsResponse>, ApiError> {
    let provider = body.options.provider.as_str();
    tracing::info!(
        provider,
        domain_id = body.domain_id.as_deref().unwrap_or_default(),
        "get_linked_accounts"
    );

    let directory = state.backends.directory(&body.secret_data)?;
    let accounts = directory.list_service_accounts(provider).await?;

    let results = accounts
        .into_iter()
        .filter_map(|account| match account.data.account_id {
            Some(account_id) if !account_id.is_empty() => Some(LinkedAccountResponse {
                account_id,
                name: account.name,
                tags: account.tags,
            }),
            _ => {
                tracing::warn!(
                    name = %account.name,
                    service_account_id = account.service_account_id.as_deref().unwrap_or_default(),
                    "service account has no data.account_id, skipping"
                );
                None
            }
        })
        .collect();

    Ok(Json(GetLinkedAccountsResponse { results }))
}

pub async fn get_data(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<GetDataRequest>,
) -> Result<Json<GetDataResponse>, ApiError> {
    let task = body.task_options.check()?;
    let months = date_range::expand(task.start, state.clock.as_ref());
    if months.is_empty() {
        tracing::warn!(
            account_id = %task.account_id,
            start = %task.start,
            "start is after the current month, nothing to collect"
        );
        return Ok(Json(GetDataResponse::default()));
    }

    tracing::info!(
        provider = %body.options.provider,
        account_id = %task.account_id,
        domain_id = %task.domain_id,
        start = %task.start,
        months = months.len(),
        "get_data"
    );

    if state.config.dispatch_mode == DispatchMode::PerTask {
        let conf = serde_json::to_string(&CollectorConf {
            task: &task,
            date_range: &months,
        })
        .map_err(|e| BillflowError::Internal(format!("failed to encode dag conf: {e}")))?;

        let orchestrator = state.backends.orchestrator(&body.secret_data)?;
        orchestrator.trigger(orchestrator.dag_name(), &conf).await?;
    }

    Ok(Json(GetDataResponse::default()))
}
