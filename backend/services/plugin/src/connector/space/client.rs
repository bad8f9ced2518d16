use std::time::Duration;

use async_trait::async_trait;
use billflow_common::error::{BillflowError, BillflowResult};
use billflow_tasks::SecretData;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::models::{ListServiceAccountsRequest, ServiceAccount, ServiceAccountList, VerifyPluginRequest};
use crate::connector::AccountDirectory;

#[derive(Debug, Clone)]
pub struct SpaceClientConfig {
    pub endpoint: String,
    pub client_secret: String,
    pub timeout_secs: u64,
}

impl SpaceClientConfig {
    /// Read the platform endpoint and its client secret from `secret_data`.
    pub fn from_secret(secret: &SecretData, timeout_secs: u64) -> BillflowResult<Self> {
        Ok(Self {
            endpoint: secret
                .require_str("spaceone_endpoint")?
                .trim_end_matches('/')
                .to_owned(),
            client_secret: secret.require_str("spaceone_client_secret")?.to_owned(),
            timeout_secs,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SpaceClientError {
    #[error("HTTP {status}: {body}")]
    HttpError { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    RequestError(#[from] reqwest::Error),
}

impl From<SpaceClientError> for BillflowError {
    fn from(err: SpaceClientError) -> Self {
        BillflowError::Upstream(err.to_string())
    }
}

/// JSON-over-HTTP client for the platform's identity service.
#[derive(Clone)]
pub struct SpaceClient {
    client: Client,
    config: SpaceClientConfig,
}

impl SpaceClient {
    pub fn new(config: SpaceClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    pub async fn list_service_accounts(
        &self,
        provider: &str,
    ) -> Result<Vec<ServiceAccount>, SpaceClientError> {
        let list: ServiceAccountList = self
            .post(
                "identity/service-account/list",
                &ListServiceAccountsRequest { provider },
            )
            .await?;
        tracing::info!(provider, count = list.results.len(), "listed service accounts");
        Ok(list.results)
    }

    pub async fn verify_plugin(&self, domain_id: &str) -> Result<(), SpaceClientError> {
        let _: serde_json::Value = self
            .post("identity/domain/get", &VerifyPluginRequest { domain_id })
            .await?;
        tracing::info!(domain_id, "plugin credentials verified");
        Ok(())
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, SpaceClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{path}", self.config.endpoint);
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.client_secret)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpaceClientError::HttpError { status, body });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl AccountDirectory for SpaceClient {
    async fn list_service_accounts(&self, provider: &str) -> BillflowResult<Vec<ServiceAccount>> {
        Ok(SpaceClient::list_service_accounts(self, provider).await?)
    }

    async fn verify_plugin(&self, domain_id: &str) -> BillflowResult<()> {
        Ok(SpaceClient::verify_plugin(self, domain_id).await?)
    }
}
