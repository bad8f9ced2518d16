use std::sync::Arc;
use std::time::Duration;

use billflow_common::error::BillflowResult;
use billflow_config::{get_var_or, parse_var_or};
use reqwest::Client;

use super::models::{ExecuteAirflowCommandRequest, ExecuteAirflowCommandResponse};
use crate::auth::TokenSource;
use crate::error::{read_json, GoogleApiError};

pub const DEFAULT_COMPOSER_URL: &str = "https://composer.googleapis.com/v1";
pub const DEFAULT_LOCATION: &str = "asia-northeast3";
pub const DEFAULT_ENVIRONMENT: &str = "spaceone-dev-composer";
pub const DEFAULT_DAG_NAME: &str = "cost_data_collector";

/// Which Composer environment runs the collector DAG.
#[derive(Debug, Clone)]
pub struct ComposerConfig {
    pub base_url: String,
    pub location: String,
    pub environment: String,
    pub dag_name: String,
    pub timeout_secs: u64,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_COMPOSER_URL.to_owned(),
            location: DEFAULT_LOCATION.to_owned(),
            environment: DEFAULT_ENVIRONMENT.to_owned(),
            dag_name: DEFAULT_DAG_NAME.to_owned(),
            timeout_secs: 30,
        }
    }
}

impl ComposerConfig {
    pub fn from_env() -> BillflowResult<Self> {
        Ok(Self {
            base_url: get_var_or("COMPOSER_BASE_URL", DEFAULT_COMPOSER_URL),
            location: get_var_or("COMPOSER_LOCATION", DEFAULT_LOCATION),
            environment: get_var_or("COMPOSER_ENVIRONMENT", DEFAULT_ENVIRONMENT),
            dag_name: get_var_or("COMPOSER_DAG_NAME", DEFAULT_DAG_NAME),
            timeout_secs: parse_var_or("HTTP_TIMEOUT_SECS", 30)?,
        })
    }
}

#[derive(Clone)]
pub struct ComposerClient {
    client: Client,
    config: ComposerConfig,
    project_id: String,
    tokens: Arc<dyn TokenSource>,
}

impl ComposerClient {
    pub fn new(
        config: ComposerConfig,
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

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    /// `projects/{project}/locations/{location}/environments/{environment}`
    pub fn environment_name(&self) -> String {
        format!(
            "projects/{}/locations/{}/environments/{}",
            self.project_id, self.config.location, self.config.environment
        )
    }

    /// Trigger one run of `dag_name` with `conf` as its JSON run configuration.
    pub async fn trigger_dag(
        &self,
        dag_name: &str,
        conf: &str,
    ) -> Result<ExecuteAirflowCommandResponse, GoogleApiError> {
        let environment = self.environment_name();
        let url = format!(
            "{}/{}:executeAirflowCommand",
            self.config.base_url, environment
        );

        tracing::info!(%environment, dag_name, "triggering airflow dag");

        let token = self.tokens.access_token().await?;
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&ExecuteAirflowCommandRequest::trigger_dag(dag_name, conf))
            .send()
            .await?;
        read_json(response).await
    }
}
