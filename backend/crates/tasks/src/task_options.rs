use billflow_common::error::{BillflowError, BillflowResult};
use serde::{Deserialize, Serialize};

use crate::month::BillingMonth;

/// Task options as received in the dispatch flow, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskOptions {
    pub start: Option<String>,
    pub account_id: Option<String>,
    pub data_source_id: Option<String>,
    #[serde(alias = "v_workspace_id")]
    pub workspace_id: Option<String>,
    pub domain_id: Option<String>,
    pub name: Option<String>,
}

/// Task options with every required field present and `start` parsed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckedTaskOptions {
    pub start: BillingMonth,
    pub account_id: String,
    pub data_source_id: String,
    #[serde(rename = "v_workspace_id")]
    pub workspace_id: String,
    pub domain_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl TaskOptions {
    /// Check required fields in a fixed order and report the first missing one.
    pub fn check(self) -> BillflowResult<CheckedTaskOptions> {
        let start = required(self.start, "task_options.start")?;
        let account_id = required(self.account_id, "task_options.account_id")?;
        let data_source_id = required(self.data_source_id, "task_options.data_source_id")?;
        let workspace_id = required(self.workspace_id, "task_options.v_workspace_id")?;
        let domain_id = required(self.domain_id, "task_options.domain_id")?;

        let start = start.parse().map_err(|e: crate::month::MonthParseError| {
            BillflowError::invalid("task_options.start", e.to_string())
        })?;

        Ok(CheckedTaskOptions {
            start,
            account_id,
            data_source_id,
            workspace_id,
            domain_id,
            name: self.name,
        })
    }
}

fn required(value: Option<String>, key: &str) -> BillflowResult<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| BillflowError::required(key))
}
