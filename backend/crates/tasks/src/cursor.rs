use billflow_common::error::{BillflowError, BillflowResult};
use chrono::{DateTime, Duration, FixedOffset, Utc};

use crate::clock::Clock;
use crate::month::BillingMonth;

/// How far before the last synchronization an incremental run restarts.
pub const LAST_SYNC_LOOKBACK_DAYS: i64 = 7;

/// Lookback for a run with neither an explicit start nor a last sync.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 365;

/// Resolve the month an extraction starts from.
///
/// Precedence: `explicit_start` (strict `YYYY-MM`), then
/// `last_synchronized_at` minus [`LAST_SYNC_LOOKBACK_DAYS`], then the clock
/// minus [`DEFAULT_LOOKBACK_DAYS`]. Timestamps are floored to their month in
/// their own offset. An empty `explicit_start` counts as absent.
pub fn resolve(
    explicit_start: Option<&str>,
    last_synchronized_at: Option<DateTime<FixedOffset>>,
    clock: &dyn Clock,
) -> BillflowResult<BillingMonth> {
    resolve_at(explicit_start, last_synchronized_at, clock.now())
}

/// [`resolve`] against an already-read `now`.
pub fn resolve_at(
    explicit_start: Option<&str>,
    last_synchronized_at: Option<DateTime<FixedOffset>>,
    now: DateTime<Utc>,
) -> BillflowResult<BillingMonth> {
    if let Some(start) = explicit_start.filter(|s| !s.is_empty()) {
        return parse_start(start);
    }

    let date = match last_synchronized_at {
        Some(last) => (last - Duration::days(LAST_SYNC_LOOKBACK_DAYS)).date_naive(),
        None => (now - Duration::days(DEFAULT_LOOKBACK_DAYS)).date_naive(),
    };
    Ok(BillingMonth::of(date))
}

fn parse_start(start: &str) -> BillflowResult<BillingMonth> {
    start
        .parse()
        .map_err(|e: crate::month::MonthParseError| BillflowError::invalid("start", e.to_string()))
}
