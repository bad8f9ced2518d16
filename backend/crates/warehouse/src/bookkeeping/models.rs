use billflow_common::error::{BillflowError, BillflowResult};
use billflow_gcp::bigquery::models::{TableFieldSchema, TableSchema};
use billflow_tasks::JobBatch;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One audit row per `get_tasks` invocation.
///
/// Both columns hold JSON text: `task_options` is the task map keyed by
/// account id and `created_at` is a JSON-encoded timestamp string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobTaskRow {
    pub task_options: String,
    pub created_at: String,
}

impl JobTaskRow {
    pub fn from_batch(batch: &JobBatch, created_at: DateTime<Utc>) -> BillflowResult<Self> {
        let stamp = created_at.format(CREATED_AT_FORMAT).to_string();
        let created_at = serde_json::to_string(&stamp)
            .map_err(|e| BillflowError::Internal(format!("failed to encode created_at: {e}")))?;

        Ok(Self {
            task_options: batch.task_map_json()?,
            created_at,
        })
    }
}

/// Fixed schema of the bookkeeping table.
pub fn job_tasks_schema() -> TableSchema {
    TableSchema {
        fields: vec![
            TableFieldSchema::required("task_options", "JSON"),
            TableFieldSchema::required("created_at", "STRING"),
        ],
    }
}

/// What a bookkeeping attempt did. Insert failures end up in `errors`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BookkeepingOutcome {
    pub dataset_created: bool,
    pub table_created: bool,
    pub table_visible: bool,
    pub inserted: bool,
    pub errors: Vec<String>,
}
