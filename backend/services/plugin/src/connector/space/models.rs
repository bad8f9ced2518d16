use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ServiceAccountData {
    #[serde(default)]
    pub account_id: Option<String>,
}

/// Service account as listed by the identity service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServiceAccount {
    #[serde(default)]
    pub service_account_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub data: ServiceAccountData,
    #[serde(default)]
    pub tags: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ServiceAccountList {
    #[serde(default)]
    pub results: Vec<ServiceAccount>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ListServiceAccountsRequest<'a> {
    pub provider: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct VerifyPluginRequest<'a> {
    pub domain_id: &'a str,
}
