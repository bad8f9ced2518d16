use billflow_tasks::{PluginOptions, SecretData, TaskOptions};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct GetLinkedAccountsRequest {
    #[serde(default)]
    pub options: PluginOptions,
    #[serde(default)]
    pub secret_data: SecretData,
    #[serde(default)]
    pub domain_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GetDataRequest {
    #[serde(default)]
    pub options: PluginOptions,
    #[serde(default)]
    pub secret_data: SecretData,
    #[serde(default)]
    pub task_options: TaskOptions,
}
