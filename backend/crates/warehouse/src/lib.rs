//! Job bookkeeping: one audit row per task batch, written to the warehouse.

pub mod bookkeeping;

pub use bookkeeping::bigquery_repository::BigQueryRepository;
pub use bookkeeping::bookkeeper::{JobBookkeeper, VisibilityPolicy};
pub use bookkeeping::models::{job_tasks_schema, BookkeepingOutcome, JobTaskRow};
pub use bookkeeping::repositories::WarehouseRepository;
