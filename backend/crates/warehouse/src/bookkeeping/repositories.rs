use async_trait::async_trait;
use billflow_common::error::BillflowResult;
use billflow_gcp::bigquery::models::TableSchema;

use crate::bookkeeping::models::JobTaskRow;

#[async_trait]
pub trait WarehouseRepository: Send + Sync {
    /// Ids of every dataset in the project.
    async fn list_datasets(&self) -> BillflowResult<Vec<String>>;

    async fn create_dataset(&self, dataset_id: &str) -> BillflowResult<()>;

    /// `Ok(false)` when the table does not exist; any other failure is an error.
    async fn table_exists(&self, dataset_id: &str, table_id: &str) -> BillflowResult<bool>;

    async fn create_table(
        &self,
        dataset_id: &str,
        table_id: &str,
        schema: &TableSchema,
    ) -> BillflowResult<()>;

    /// Append rows. Returns per-row error messages; empty means all rows landed.
    async fn insert_rows(
        &self,
        dataset_id: &str,
        table_id: &str,
        rows: &[JobTaskRow],
    ) -> BillflowResult<Vec<String>>;
}

#[async_trait]
impl<T: WarehouseRepository + ?Sized> WarehouseRepository for std::sync::Arc<T> {
    async fn list_datasets(&self) -> BillflowResult<Vec<String>> {
        (**self).list_datasets().await
    }

    async fn create_dataset(&self, dataset_id: &str) -> BillflowResult<()> {
        (**self).create_dataset(dataset_id).await
    }

    async fn table_exists(&self, dataset_id: &str, table_id: &str) -> BillflowResult<bool> {
        (**self).table_exists(dataset_id, table_id).await
    }

    async fn create_table(
        &self,
        dataset_id: &str,
        table_id: &str,
        schema: &TableSchema,
    ) -> BillflowResult<()> {
        (**self).create_table(dataset_id, table_id, schema).await
    }

    async fn insert_rows(
        &self,
        dataset_id: &str,
        table_id: &str,
        rows: &[JobTaskRow],
    ) -> BillflowResult<Vec<String>> {
        (**self).insert_rows(dataset_id, table_id, rows).await
    }
}
