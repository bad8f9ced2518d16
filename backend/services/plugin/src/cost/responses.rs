use billflow_tasks::{BillingMonth, CheckedTaskOptions};
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Serialize)]
pub struct LinkedAccountResponse {
    pub account_id: String,
    pub name: String,
    pub tags: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct GetLinkedAccountsResponse {
    pub results: Vec<LinkedAccountResponse>,
}

/// Cost rows are produced by the DAG, never inline.
#[derive(Debug, Default, Serialize)]
pub struct GetDataResponse {
    pub results: Vec<Value>,
}

/// Run configuration handed to the collector DAG for one task.
#[derive(Debug, Serialize)]
pub struct CollectorConf<'a> {
    #[serde(flatten)]
    pub task: &'a CheckedTaskOptions,
    pub date_range: &'a [BillingMonth],
}
