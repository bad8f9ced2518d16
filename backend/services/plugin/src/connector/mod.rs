pub mod backends;
pub mod composer;
pub mod space;

use async_trait::async_trait;
use billflow_common::error::BillflowResult;
use billflow_gcp::composer::models::ExecuteAirflowCommandResponse;

use crate::connector::space::models::ServiceAccount;

/// Accounts known to the cost-management platform.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    async fn list_service_accounts(&self, provider: &str) -> BillflowResult<Vec<ServiceAccount>>;
    async fn verify_plugin(&self, domain_id: &str) -> BillflowResult<()>;
}

/// Workflow engine that runs the extraction.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// DAG triggered when the caller does not name one.
    fn dag_name(&self) -> &str;

    /// Fire-and-forget: the run is not awaited.
    async fn trigger(
        &self,
        dag_name: &str,
        conf: &str,
    ) -> BillflowResult<ExecuteAirflowCommandResponse>;
}
