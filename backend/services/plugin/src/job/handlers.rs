use axum::extract::State;
use axum::Json;
use billflow_common::error::BillflowResult;
use billflow_config::DispatchMode;
use billflow_tasks::{build_tasks, FixedClock, JobBatch, SecretData};
use billflow_warehouse::JobBookkeeper;

use crate::error::ApiError;
use crate::extractors::JsonBody;
use crate::job::requests::GetTasksRequest;
use crate::job::responses::GetTasksResponse;
use crate::AppState;

pub async fn get_tasks(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<GetTasksRequest>,
) -> Result<Json<GetTasksResponse>, ApiError> {
    // One reading of the clock covers partitioning and the bookkeeping stamp.
    let now = state.clock.now();

    tracing::info!(
        domain_id = body.domain_id.as_deref().unwrap_or_default(),
        accounts = body.linked_accounts.len(),
        start = body.start.as_deref().unwrap_or_default(),
        "get_tasks"
    );

    let batch = build_tasks(
        &body.linked_accounts,
        body.start.as_deref(),
        body.last_synchronized_at,
        &FixedClock::new(now),
    )?;

    let warehouse = state.backends.warehouse(&body.secret_data)?;
    let keeper = JobBookkeeper::new(warehouse, state.visibility.clone());
    let outcome = keeper
        .record(&body.options.dataset, &body.options.table, &batch, now)
        .await?;
    if !outcome.inserted {
        tracing::warn!(errors = ?outcome.errors, "job batch was not recorded");
    }

    if state.config.dispatch_mode == DispatchMode::Batch {
        dispatch_batch(&state, &body.secret_data, &batch).await?;
    }

    Ok(Json(GetTasksResponse::from(batch)))
}

/// Trigger one DAG run whose conf is the whole task map.
async fn dispatch_batch(
    state: &AppState,
    secret: &SecretData,
    batch: &JobBatch,
) -> BillflowResult<()> {
    if batch.tasks.is_empty() {
        tracing::info!("no tasks to dispatch");
        return Ok(());
    }

    let orchestrator = state.backends.orchestrator(secret)?;
    let conf = batch.task_map_json()?;
    orchestrator.trigger(orchestrator.dag_name(), &conf).await?;
    Ok(())
}
