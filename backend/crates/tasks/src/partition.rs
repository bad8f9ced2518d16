use billflow_common::error::BillflowResult;
use chrono::{DateTime, FixedOffset};

use crate::clock::Clock;
use crate::cursor::resolve_at;
use crate::models::{ChangeRecord, JobBatch, LinkedAccount, SyncState, Task};
use crate::month::BillingMonth;

/// Partition linked accounts into per-account extraction tasks.
///
/// The batch cursor is resolved once from `explicit_start` and
/// `last_synchronized_at` and shared by every incrementally synced account.
/// Accounts that were never synchronized ignore `last_synchronized_at` and get
/// an account-scoped [`ChangeRecord`]. The batch baseline record always comes
/// last. An account whose start lies after the current month gets no task but
/// keeps its change records. The clock is read exactly once.
pub fn build_tasks(
    linked_accounts: &[LinkedAccount],
    explicit_start: Option<&str>,
    last_synchronized_at: Option<DateTime<FixedOffset>>,
    clock: &dyn Clock,
) -> BillflowResult<JobBatch> {
    let now = clock.now();
    let current = BillingMonth::of(now.date_naive());
    let batch_cursor = resolve_at(explicit_start, last_synchronized_at, now)?;

    let mut batch = JobBatch::default();

    for account in linked_accounts {
        tracing::debug!(
            account_id = %account.account_id,
            name = %account.name,
            sync_state = ?account.sync_state,
            "building task"
        );

        let start = match account.sync_state {
            SyncState::FirstSync => {
                let first_sync_month = resolve_at(explicit_start, None, now)?;
                batch
                    .changed
                    .push(ChangeRecord::account(first_sync_month, &account.account_id));
                first_sync_month
            }
            SyncState::Incremental => batch_cursor,
        };

        match Task::for_account(account, start, current) {
            Some(task) => batch.insert_task(task),
            None => tracing::warn!(
                account_id = %account.account_id,
                %start,
                %current,
                "start is after the current month, no task built"
            ),
        }
    }

    batch.changed.push(ChangeRecord::baseline(batch_cursor));

    tracing::debug!(
        tasks = batch.tasks.len(),
        changed = batch.changed.len(),
        cursor = %batch_cursor,
        "task batch built"
    );
    Ok(batch)
}
