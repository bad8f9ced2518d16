use std::iter;

use chrono::{DateTime, Utc};

use crate::clock::Clock;
use crate::month::BillingMonth;

/// Every month from `start` through the clock's current month (UTC), ascending.
/// Empty when `start` is in the future.
pub fn expand(start: BillingMonth, clock: &dyn Clock) -> Vec<BillingMonth> {
    expand_at(start, clock.now())
}

pub fn expand_at(start: BillingMonth, now: DateTime<Utc>) -> Vec<BillingMonth> {
    expand_through(start, BillingMonth::of(now.date_naive()))
}

/// Every month from `start` through `last`, inclusive.
pub fn expand_through(start: BillingMonth, last: BillingMonth) -> Vec<BillingMonth> {
    iter::successors(Some(start), |m| Some(m.succ()))
        .take_while(|m| *m <= last)
        .collect()
}
