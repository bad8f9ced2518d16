use std::time::Duration;

use billflow_common::error::BillflowResult;
use billflow_config::parse_var_or;
use billflow_tasks::JobBatch;
use chrono::{DateTime, Utc};

use crate::bookkeeping::models::{job_tasks_schema, BookkeepingOutcome, JobTaskRow};
use crate::bookkeeping::repositories::WarehouseRepository;

/// How long to wait for a freshly created table to become readable.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityPolicy {
    pub attempts: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for VisibilityPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            base_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_millis(8_000),
        }
    }
}

impl VisibilityPolicy {
    pub fn from_env() -> BillflowResult<Self> {
        Ok(Self {
            attempts: parse_var_or("BOOKKEEPING_VISIBILITY_ATTEMPTS", 5)?,
            base_backoff: Duration::from_millis(parse_var_or("BOOKKEEPING_BACKOFF_MS", 500)?),
            max_backoff: Duration::from_millis(parse_var_or("BOOKKEEPING_BACKOFF_CAP_MS", 8_000)?),
        })
    }

    /// Delay before retry number `retry` (1-based): `base * 2^(retry-1)`, capped.
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}

/// Writes one audit row per task batch into the warehouse, creating the
/// dataset and table on first use.
pub struct JobBookkeeper<R> {
    repo: R,
    policy: VisibilityPolicy,
}

impl<R: WarehouseRepository> JobBookkeeper<R> {
    pub fn new(repo: R, policy: VisibilityPolicy) -> Self {
        Self { repo, policy }
    }

    /// Record `batch` under `dataset.table`.
    ///
    /// Setup failures (listing or creating the dataset, probing or creating
    /// the table) are returned. Insert failures are logged and reported in the
    /// outcome only.
    pub async fn record(
        &self,
        dataset: &str,
        table: &str,
        batch: &JobBatch,
        created_at: DateTime<Utc>,
    ) -> BillflowResult<BookkeepingOutcome> {
        let row = JobTaskRow::from_batch(batch, created_at)?;

        let mut outcome = BookkeepingOutcome {
            dataset_created: self.ensure_dataset(dataset).await?,
            ..BookkeepingOutcome::default()
        };
        outcome.table_created = self.ensure_table(dataset, table).await?;
        outcome.table_visible = if outcome.table_created {
            self.wait_until_visible(dataset, table).await
        } else {
            true
        };

        if !outcome.table_visible {
            tracing::warn!(
                dataset,
                table,
                attempts = self.policy.attempts,
                "table not visible after creation, inserting anyway"
            );
        }

        match self.repo.insert_rows(dataset, table, &[row]).await {
            Ok(errors) if errors.is_empty() => {
                tracing::info!(dataset, table, tasks = batch.tasks.len(), "job task row added");
                outcome.inserted = true;
            }
            Ok(errors) => {
                tracing::error!(dataset, table, ?errors, "errors while inserting job task row");
                outcome.errors = errors;
            }
            Err(e) => {
                tracing::error!(dataset, table, error = %e, "failed to insert job task row");
                outcome.errors = vec![e.to_string()];
            }
        }

        Ok(outcome)
    }

    async fn ensure_dataset(&self, dataset: &str) -> BillflowResult<bool> {
        let existing = self.repo.list_datasets().await?;
        if existing.iter().any(|id| id == dataset) {
            return Ok(false);
        }

        tracing::info!(dataset, "creating dataset");
        self.repo.create_dataset(dataset).await?;
        Ok(true)
    }

    async fn ensure_table(&self, dataset: &str, table: &str) -> BillflowResult<bool> {
        if self.repo.table_exists(dataset, table).await? {
            return Ok(false);
        }

        tracing::info!(dataset, table, "creating table");
        self.repo
            .create_table(dataset, table, &job_tasks_schema())
            .await?;
        Ok(true)
    }

    async fn wait_until_visible(&self, dataset: &str, table: &str) -> bool {
        for attempt in 0..self.policy.attempts {
            if attempt > 0 {
                tokio::time::sleep(self.policy.backoff(attempt)).await;
            }
            match self.repo.table_exists(dataset, table).await {
                Ok(true) => return true,
                Ok(false) => {
                    tracing::debug!(dataset, table, attempt, "table not visible yet");
                }
                Err(e) => {
                    tracing::warn!(dataset, table, attempt, error = %e, "visibility check failed");
                }
            }
        }
        false
    }
}
