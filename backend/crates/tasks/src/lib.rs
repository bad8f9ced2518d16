//! Task partitioning for the Composer cost collector.
//!
//! Turns a set of linked billing accounts plus a synchronization cursor into a
//! [`JobBatch`]: one [`Task`] per account covering every billing month still to
//! extract, and the [`ChangeRecord`]s the host persists as its new baseline.

pub mod clock;
pub mod cursor;
pub mod date_range;
pub mod models;
pub mod month;
pub mod options;
pub mod partition;
pub mod task_options;

pub use clock::{Clock, FixedClock, SystemClock};
pub use models::{ChangeRecord, JobBatch, LinkedAccount, SyncState, Task};
pub use month::BillingMonth;
pub use options::{PluginOptions, SecretData};
pub use partition::build_tasks;
pub use task_options::{CheckedTaskOptions, TaskOptions};
