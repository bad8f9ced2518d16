use std::sync::Arc;

use billflow_common::error::{BillflowError, BillflowResult};
use billflow_gcp::auth::DEFAULT_TOKEN_URI;
use billflow_gcp::{
    BigQueryClient, BigQueryConfig, ComposerClient, ComposerConfig, ServiceAccountKey,
    ServiceAccountTokenSource, TokenSource,
};
use billflow_tasks::SecretData;
use billflow_warehouse::{BigQueryRepository, WarehouseRepository};
use reqwest::Client;

use crate::connector::composer::ComposerDispatcher;
use crate::connector::space::client::{SpaceClient, SpaceClientConfig};
use crate::connector::{AccountDirectory, Orchestrator};

/// Builds per-request collaborators from the caller's `secret_data`.
pub trait Backends: Send + Sync {
    fn directory(&self, secret: &SecretData) -> BillflowResult<Arc<dyn AccountDirectory>>;
    fn orchestrator(&self, secret: &SecretData) -> BillflowResult<Arc<dyn Orchestrator>>;
    fn warehouse(&self, secret: &SecretData) -> BillflowResult<Arc<dyn WarehouseRepository>>;
}

/// Google Cloud and platform clients authenticated with the secret's
/// service account.
pub struct GoogleBackends {
    http: Client,
    composer: ComposerConfig,
    bigquery: BigQueryConfig,
    timeout_secs: u64,
}

impl GoogleBackends {
    pub fn new(
        composer: ComposerConfig,
        bigquery: BigQueryConfig,
        timeout_secs: u64,
    ) -> BillflowResult<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| BillflowError::Internal(format!("failed to build http client: {e}")))?;
        Ok(Self {
            http,
            composer,
            bigquery,
            timeout_secs,
        })
    }

    pub fn from_env(timeout_secs: u64) -> BillflowResult<Self> {
        Self::new(
            ComposerConfig::from_env()?,
            BigQueryConfig::from_env()?,
            timeout_secs,
        )
    }

    fn token_source(&self, secret: &SecretData) -> BillflowResult<Arc<dyn TokenSource>> {
        let key = service_account_key(secret)?;
        let tokens = ServiceAccountTokenSource::new(self.http.clone(), key)
            .map_err(|e| BillflowError::invalid("secret_data.private_key", e.to_string()))?;
        Ok(Arc::new(tokens))
    }
}

pub fn service_account_key(secret: &SecretData) -> BillflowResult<ServiceAccountKey> {
    Ok(ServiceAccountKey {
        client_email: secret.require_str("client_email")?.to_owned(),
        private_key: secret.require_str("private_key")?.to_owned(),
        token_uri: secret
            .get_str("token_uri")
            .filter(|u| !u.is_empty())
            .unwrap_or(DEFAULT_TOKEN_URI)
            .to_owned(),
    })
}

fn client_error(e: reqwest::Error) -> BillflowError {
    BillflowError::Internal(format!("failed to build client: {e}"))
}

impl Backends for GoogleBackends {
    fn directory(&self, secret: &SecretData) -> BillflowResult<Arc<dyn AccountDirectory>> {
        let config = SpaceClientConfig::from_secret(secret, self.timeout_secs)?;
        Ok(Arc::new(SpaceClient::new(config).map_err(client_error)?))
    }

    fn orchestrator(&self, secret: &SecretData) -> BillflowResult<Arc<dyn Orchestrator>> {
        let project_id = secret.project_id()?;
        let tokens = self.token_source(secret)?;
        let client = ComposerClient::new(self.composer.clone(), project_id, tokens)
            .map_err(client_error)?;
        Ok(Arc::new(ComposerDispatcher::new(client)))
    }

    fn warehouse(&self, secret: &SecretData) -> BillflowResult<Arc<dyn WarehouseRepository>> {
        let project_id = secret.project_id()?;
        let tokens = self.token_source(secret)?;
        let client = BigQueryClient::new(self.bigquery.clone(), project_id, tokens)
            .map_err(client_error)?;
        Ok(Arc::new(BigQueryRepository::new(client)))
    }
}
