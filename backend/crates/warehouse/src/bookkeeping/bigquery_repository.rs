use async_trait::async_trait;
use billflow_common::error::{BillflowError, BillflowResult};
use billflow_gcp::bigquery::models::TableSchema;
use billflow_gcp::{BigQueryClient, GoogleApiError};

use crate::bookkeeping::models::JobTaskRow;
use crate::bookkeeping::repositories::WarehouseRepository;

#[derive(Clone)]
pub struct BigQueryRepository {
    client: BigQueryClient,
}

impl BigQueryRepository {
    pub fn new(client: BigQueryClient) -> Self {
        Self { client }
    }
}

fn warehouse_error(e: GoogleApiError) -> BillflowError {
    BillflowError::Warehouse(e.to_string())
}

#[async_trait]
impl WarehouseRepository for BigQueryRepository {
    async fn list_datasets(&self) -> BillflowResult<Vec<String>> {
        let datasets = self.client.list_datasets().await.map_err(warehouse_error)?;
        Ok(datasets
            .into_iter()
            .map(|d| d.dataset_reference.dataset_id)
            .collect())
    }

    async fn create_dataset(&self, dataset_id: &str) -> BillflowResult<()> {
        self.client
            .create_dataset(dataset_id)
            .await
            .map_err(warehouse_error)?;
        Ok(())
    }

    async fn table_exists(&self, dataset_id: &str, table_id: &str) -> BillflowResult<bool> {
        match self.client.get_table(dataset_id, table_id).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(warehouse_error(e)),
        }
    }

    async fn create_table(
        &self,
        dataset_id: &str,
        table_id: &str,
        schema: &TableSchema,
    ) -> BillflowResult<()> {
        self.client
            .create_table(dataset_id, table_id, schema)
            .await
            .map_err(warehouse_error)?;
        Ok(())
    }

    async fn insert_rows(
        &self,
        dataset_id: &str,
        table_id: &str,
        rows: &[JobTaskRow],
    ) -> BillflowResult<Vec<String>> {
        let values = rows
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| BillflowError::Internal(format!("failed to encode row: {e}")))?;

        let response = self
            .client
            .insert_rows(dataset_id, table_id, &values)
            .await
            .map_err(warehouse_error)?;

        Ok(response
            .insert_errors
            .iter()
            .flat_map(|row| {
                row.errors.iter().map(move |err| {
                    format!(
                        "row {}: {} ({})",
                        row.index,
                        err.message.as_deref().unwrap_or("unknown error"),
                        err.reason.as_deref().unwrap_or("unknown")
                    )
                })
            })
            .collect())
    }
}
