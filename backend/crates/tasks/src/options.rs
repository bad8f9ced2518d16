use std::fmt;

use billflow_common::error::{BillflowError, BillflowResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_PROVIDER: &str = "aws";
pub const DEFAULT_DATASET: &str = "plugin_airflow_cost_datasource";
pub const DEFAULT_TABLE: &str = "job_tasks";

/// Data source options the platform passes with every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginOptions {
    /// Billing provider whose service accounts are linked.
    pub provider: String,
    /// Warehouse dataset holding the job bookkeeping table.
    pub dataset: String,
    pub table: String,
}

impl Default for PluginOptions {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_owned(),
            dataset: DEFAULT_DATASET.to_owned(),
            table: DEFAULT_TABLE.to_owned(),
        }
    }
}

/// Credential bundle. Only `project_id` matters to task generation; the
/// remaining fields are read by the collaborator clients.
#[derive(Clone, Default, Deserialize)]
pub struct SecretData {
    #[serde(default)]
    project_id: Option<String>,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl SecretData {
    pub fn from_value(value: Value) -> BillflowResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| BillflowError::invalid("secret_data", e.to_string()))
    }

    /// Project that namespaces the warehouse dataset and composer environment.
    pub fn project_id(&self) -> BillflowResult<&str> {
        self.project_id
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| BillflowError::required("secret_data.project_id"))
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn require_str(&self, key: &str) -> BillflowResult<&str> {
        self.get_str(key)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| BillflowError::required(format!("secret_data.{key}")))
    }
}

// Values are credentials; only the key names are printed.
impl fmt::Debug for SecretData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretData")
            .field("project_id", &self.project_id)
            .field("keys", &self.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}
