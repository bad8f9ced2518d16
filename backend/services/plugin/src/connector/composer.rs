use async_trait::async_trait;
use billflow_common::error::{BillflowError, BillflowResult};
use billflow_gcp::composer::models::ExecuteAirflowCommandResponse;
use billflow_gcp::ComposerClient;

use crate::connector::Orchestrator;

pub struct ComposerDispatcher {
    client: ComposerClient,
}

impl ComposerDispatcher {
    pub fn new(client: ComposerClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Orchestrator for ComposerDispatcher {
    fn dag_name(&self) -> &str {
        &self.client.config().dag_name
    }

    async fn trigger(
        &self,
        dag_name: &str,
        conf: &str,
    ) -> BillflowResult<ExecuteAirflowCommandResponse> {
        let response = self
            .client
            .trigger_dag(dag_name, conf)
            .await
            .map_err(|e| BillflowError::Orchestrator(e.to_string()))?;

        if let Some(error) = response.error.as_deref().filter(|e| !e.is_empty()) {
            return Err(BillflowError::Orchestrator(error.to_owned()));
        }

        tracing::info!(
            dag_name,
            execution_id = response.execution_id.as_deref().unwrap_or_default(),
            "dag run triggered"
        );
        Ok(response)
    }
}
