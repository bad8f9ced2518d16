use std::collections::BTreeMap;

use billflow_common::error::{BillflowError, BillflowResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::date_range::expand_through;
use crate::month::BillingMonth;

/// Whether an account has completed a synchronization before.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    #[default]
    FirstSync,
    Incremental,
}

/// The platform sends `is_sync` as `"true"`/`"false"` text, sometimes as a
/// bool. Missing, null and either spelling of false mean never synchronized.
impl<'de> Deserialize<'de> for SyncState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Flag {
            Bool(bool),
            Text(String),
        }

        Ok(match Option::<Flag>::deserialize(deserializer)? {
            None | Some(Flag::Bool(false)) => Self::FirstSync,
            Some(Flag::Text(text)) if text == "false" => Self::FirstSync,
            Some(_) => Self::Incremental,
        })
    }
}

impl Serialize for SyncState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(match self {
            Self::FirstSync => "false",
            Self::Incremental => "true",
        })
    }
}

/// A billing account linked to a platform workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedAccount {
    pub account_id: String,
    pub name: String,
    pub data_source_id: String,
    #[serde(alias = "v_workspace_id")]
    pub workspace_id: String,
    #[serde(default, rename = "is_sync")]
    pub sync_state: SyncState,
}

/// One unit of extraction work: every month of one account still to collect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub account_id: String,
    pub name: String,
    pub data_source_id: String,
    #[serde(rename = "v_workspace_id", alias = "workspace_id")]
    pub workspace_id: String,
    pub start: BillingMonth,
    pub date_range: Vec<BillingMonth>,
}

impl Task {
    /// Build the task for `account` covering `start` through `current`.
    /// `None` when `start` is after `current`: there is nothing to extract yet.
    pub fn for_account(
        account: &LinkedAccount,
        start: BillingMonth,
        current: BillingMonth,
    ) -> Option<Self> {
        let date_range = expand_through(start, current);
        if date_range.is_empty() {
            return None;
        }

        Some(Self {
            account_id: account.account_id.clone(),
            name: account.name.clone(),
            data_source_id: account.data_source_id.clone(),
            workspace_id: account.workspace_id.clone(),
            start,
            date_range,
        })
    }
}

/// A cursor advance the host persists after the job.
///
/// Account-scoped records mark the end of a first sync; the record without an
/// account id is the batch baseline for future incremental runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub start: BillingMonth,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}

impl ChangeRecord {
    pub fn account(start: BillingMonth, account_id: &str) -> Self {
        Self {
            start,
            account_id: Some(account_id.to_owned()),
        }
    }

    pub fn baseline(start: BillingMonth) -> Self {
        Self {
            start,
            account_id: None,
        }
    }
}

/// All tasks and cursor changes produced by one invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobBatch {
    pub tasks: Vec<Task>,
    pub changed: Vec<ChangeRecord>,
}

impl JobBatch {
    /// Add a task keyed by its account id. A task for an account already in the
    /// batch replaces the earlier one in place.
    pub fn insert_task(&mut self, task: Task) {
        match self.tasks.iter_mut().find(|t| t.account_id == task.account_id) {
            Some(existing) => {
                tracing::warn!(
                    account_id = %task.account_id,
                    "duplicate linked account in batch, keeping the last one"
                );
                *existing = task;
            }
            None => self.tasks.push(task),
        }
    }

    pub fn task(&self, account_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.account_id == account_id)
    }

    /// Tasks keyed by account id, the shape persisted and dispatched.
    pub fn task_map(&self) -> BTreeMap<&str, &Task> {
        self.tasks
            .iter()
            .map(|t| (t.account_id.as_str(), t))
            .collect()
    }

    pub fn task_map_json(&self) -> BillflowResult<String> {
        serde_json::to_string(&self.task_map())
            .map_err(|e| BillflowError::Internal(format!("failed to encode task map: {e}")))
    }

    /// The batch-level cursor, always the last change record.
    pub fn baseline(&self) -> Option<BillingMonth> {
        self.changed
            .last()
            .filter(|c| c.account_id.is_none())
            .map(|c| c.start)
    }
}
