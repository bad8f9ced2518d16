use serde::{Deserialize, Serialize};

/// Body of `environments.executeAirflowCommand`.
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteAirflowCommandRequest {
    pub command: String,
    pub subcommand: String,
    pub parameters: Vec<String>,
}

impl ExecuteAirflowCommandRequest {
    /// `airflow dags trigger <dag> --conf <json>`
    pub fn trigger_dag(dag_name: &str, conf: &str) -> Self {
        Self {
            command: "dags".to_owned(),
            subcommand: "trigger".to_owned(),
            parameters: vec![dag_name.to_owned(), "--conf".to_owned(), conf.to_owned()],
        }
    }
}

/// Handle of an accepted Airflow command. Output is not polled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteAirflowCommandResponse {
    #[serde(default)]
    pub execution_id: Option<String>,
    #[serde(default)]
    pub pod: Option<String>,
    #[serde(default)]
    pub pod_namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
