use billflow_tasks::{PluginOptions, SecretData};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct InitRequest {
    #[serde(default)]
    pub options: PluginOptions,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    #[serde(default)]
    pub options: PluginOptions,
    #[serde(default)]
    pub secret_data: SecretData,
    #[serde(default)]
    pub domain_id: Option<String>,
}
