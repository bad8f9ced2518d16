use std::sync::Arc;
use std::time::Duration;

use billflow_common::error::BillflowResult;
use billflow_config::{get_var_or, parse_var_or};
use reqwest::Client;
use serde_json::Value;

use super::models::{
    Dataset, DatasetList, DatasetReference, InsertAllRequest, InsertAllResponse, InsertRow, Table,
    TableReference, TableSchema,
};
use crate::auth::TokenSource;
use crate::error::{read_json, GoogleApiError};

pub const DEFAULT_BIGQUERY_URL: &str = "https://bigquery.googleapis.com/bigquery/v2";
pub const DEFAULT_LOCATION: &str = "asia-northeast3";

#[derive(Debug, Clone)]
pub struct BigQueryConfig {
    pub base_url: String,
    /// Location new datasets are created in.
    pub location: String,
    pub timeout_secs: u64,
}

impl Default for BigQueryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BIGQUERY_URL.to_owned(),
            location: DEFAULT_LOCATION.to_owned(),
            timeout_secs: 30,
        }
    }
}

impl BigQueryConfig {
    pub fn from_env() -> BillflowResult<Self> {
        Ok(Self {
            base_url: get_var_or("BIGQUERY_BASE_URL", DEFAULT_BIGQUERY_URL),
            location: get_var_or("WAREHOUSE_LOCATION", DEFAULT_LOCATION),
            timeout_secs: parse_var_or("HTTP_TIMEOUT_SECS", 30)?,
        })
    }
}

#[derive(Clone)]
pub struct BigQueryClient {
    client: Client,
    config: BigQueryConfig,
    project_id: String,
    tokens: Arc<dyn TokenSource>,
}

impl BigQueryClient {
    pub fn new(
        config: BigQueryConfig,
        project_id: &str,
        tokens: Arc<dyn TokenSource>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            config,
            project_id: project_id.to_owned(),
            tokens,
        })
    }

    fn project_url(&self) -> String {
        format!("{}/projects/{}", self.config.base_url, self.project_id)
    }

    /// List every dataset in the project, following page tokens.
    pub async fn list_datasets(&self) -> Result<Vec<Dataset>, GoogleApiError> {
        let url = format!("{}/datasets", self.project_url());
        let mut datasets = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let token = self.tokens.access_token().await?;
            let mut request = self.client.get(&url).bearer_auth(token);
            if let Some(page) = &page_token {
                request = request.query(&[("pageToken", page.as_str())]);
            }

            let page: DatasetList = read_json(request.send().await?).await?;
            datasets.extend(page.datasets);

            match page.next_page_token {
                Some(next) if !next.is_empty() => page_token = Some(next),
                _ => break,
            }
        }

        Ok(datasets)
    }

    pub async fn create_dataset(&self, dataset_id: &str) -> Result<Dataset, GoogleApiError> {
        let body = Dataset {
            dataset_reference: DatasetReference {
                project_id: self.project_id.clone(),
                dataset_id: dataset_id.to_owned(),
            },
            location: Some(self.config.location.clone()),
        };

        let token = self.tokens.access_token().await?;
        let response = self
            .client
            .post(format!("{}/datasets", self.project_url()))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        read_json(response).await
    }

    /// Fetch table metadata. A missing table is an `HttpError` with status 404;
    /// see [`GoogleApiError::is_not_found`].
    pub async fn get_table(&self, dataset_id: &str, table_id: &str) -> Result<Table, GoogleApiError> {
        let token = self.tokens.access_token().await?;
        let response = self
            .client
            .get(format!(
                "{}/datasets/{}/tables/{}",
                self.project_url(),
                dataset_id,
                table_id
            ))
            .bearer_auth(token)
            .send()
            .await?;
        read_json(response).await
    }

    pub async fn create_table(
        &self,
        dataset_id: &str,
        table_id: &str,
        schema: &TableSchema,
    ) -> Result<Table, GoogleApiError> {
        let body = Table {
            table_reference: TableReference {
                project_id: self.project_id.clone(),
                dataset_id: dataset_id.to_owned(),
                table_id: table_id.to_owned(),
            },
            schema: Some(schema.clone()),
        };

        let token = self.tokens.access_token().await?;
        let response = self
            .client
            .post(format!("{}/datasets/{}/tables", self.project_url(), dataset_id))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        read_json(response).await
    }

    /// Streaming insert. Per-row failures come back in
    /// [`InsertAllResponse::insert_errors`], not as an `Err`.
    pub async fn insert_rows(
        &self,
        dataset_id: &str,
        table_id: &str,
        rows: &[Value],
    ) -> Result<InsertAllResponse, GoogleApiError> {
        let body = InsertAllRequest {
            rows: rows.iter().map(|json| InsertRow { json }).collect(),
        };

        let token = self.tokens.access_token().await?;
        let response = self
            .client
            .post(format!(
                "{}/datasets/{}/tables/{}/insertAll",
                self.project_url(),
                dataset_id,
                table_id
            ))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        read_json(response).await
    }
}
