mod connector;
mod cost;
mod data_source;
mod error;
mod extractors;
mod job;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Json, Router};
use billflow_common::types::ServiceInfo;
use billflow_config::{init_tracing, AppConfig};
use billflow_tasks::{Clock, SystemClock};
use billflow_warehouse::VisibilityPolicy;
use tower_http::trace::TraceLayer;

use crate::connector::backends::{Backends, GoogleBackends};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub clock: Arc<dyn Clock>,
    pub backends: Arc<dyn Backends>,
    pub visibility: VisibilityPolicy,
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn info() -> Json<ServiceInfo> {
    Json(ServiceInfo::new("billflow-plugin", env!("CARGO_PKG_VERSION")))
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/info", get(info))
        .merge(job::router())
        .merge(cost::router())
        .merge(data_source::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() {
    let config = AppConfig::from_env().expect("failed to load config");
    init_tracing(&config.log_level);
    tracing::info!(
        service = "billflow-plugin",
        dispatch_mode = ?config.dispatch_mode,
        "starting"
    );

    let backends = GoogleBackends::from_env(config.http_timeout_secs)
        .expect("failed to configure google clients");
    let visibility = VisibilityPolicy::from_env().expect("failed to load bookkeeping policy");

    let addr: SocketAddr = config.bind_addr().parse().expect("invalid bind address");
    let state = AppState {
        config,
        clock: Arc::new(SystemClock),
        backends: Arc::new(backends),
        visibility,
    };
    let app = build_router(state);

    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");
    axum::serve(listener, app).await.expect("server error");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use billflow_common::error::{BillflowError, BillflowResult};
    use billflow_config::DispatchMode;
    use billflow_gcp::bigquery::models::TableSchema;
    use billflow_gcp::composer::models::ExecuteAirflowCommandResponse;
    use billflow_tasks::{FixedClock, SecretData};
    use billflow_warehouse::{JobTaskRow, WarehouseRepository};
    use serde_json::{json, Value};
    use std::sync::Mutex;
    use std::time::Duration;
    use tower::ServiceExt;

    use crate::connector::space::models::{ServiceAccount, ServiceAccountData};
    use crate::connector::{AccountDirectory, Orchestrator};

    #[derive(Default)]
    struct Recorded {
        triggers: Vec<(String, String)>,
        rows: Vec<JobTaskRow>,
        warehouse_calls: usize,
        verified: Vec<String>,
    }

    #[derive(Clone, Default)]
    struct MockBackends {
        recorded: Arc<Mutex<Recorded>>,
        accounts: Vec<ServiceAccount>,
        fail_warehouse: bool,
        fail_insert: bool,
        fail_verify: bool,
    }

    impl MockBackends {
        fn recorded(&self) -> std::sync::MutexGuard<'_, Recorded> {
            self.recorded.lock().unwrap()
        }
    }

    #[async_trait]
    impl AccountDirectory for MockBackends {
        async fn list_service_accounts(&self, provider: &str) -> BillflowResult<Vec<ServiceAccount>> {
            assert_eq!(provider, "aws");
            Ok(self.accounts.clone())
        }

        async fn verify_plugin(&self, domain_id: &str) -> BillflowResult<()> {
            if self.fail_verify {
                return Err(BillflowError::Upstream("HTTP 401: unauthorized".into()));
            }
            self.recorded().verified.push(domain_id.to_string());
            Ok(())
        }
    }

    #[async_trait]
    impl Orchestrator for MockBackends {
        fn dag_name(&self) -> &str {
            "cost_data_collector"
        }

        async fn trigger(
            &self,
            dag_name: &str,
            conf: &str,
        ) -> BillflowResult<ExecuteAirflowCommandResponse> {
            self.recorded()
                .triggers
                .push((dag_name.to_string(), conf.to_string()));
            Ok(ExecuteAirflowCommandResponse {
                execution_id: Some("exec-1".into()),
                ..Default::default()
            })
        }
    }

    #[async_trait]
    impl WarehouseRepository for MockBackends {
        async fn list_datasets(&self) -> BillflowResult<Vec<String>> {
            self.recorded().warehouse_calls += 1;
            if self.fail_warehouse {
                return Err(BillflowError::Warehouse("HTTP 403: access denied".into()));
            }
            Ok(vec!["plugin_airflow_cost_datasource".into()])
        }

        async fn create_dataset(&self, _dataset_id: &str) -> BillflowResult<()> {
            Ok(())
        }

        async fn table_exists(&self, _dataset_id: &str, _table_id: &str) -> BillflowResult<bool> {
            Ok(true)
        }

        async fn create_table(
            &self,
            _dataset_id: &str,
            _table_id: &str,
            _schema: &TableSchema,
        ) -> BillflowResult<()> {
            Ok(())
        }

        async fn insert_rows(
            &self,
            _dataset_id: &str,
            _table_id: &str,
            rows: &[JobTaskRow],
        ) -> BillflowResult<Vec<String>> {
            if self.fail_insert {
                return Ok(vec!["row 0: bad json (invalid)".into()]);
            }
            self.recorded().rows.extend_from_slice(rows);
            Ok(Vec::new())
        }
    }

    impl Backends for MockBackends {
        fn directory(&self, _secret: &SecretData) -> BillflowResult<Arc<dyn AccountDirectory>> {
            Ok(Arc::new(self.clone()))
        }

        fn orchestrator(&self, _secret: &SecretData) -> BillflowResult<Arc<dyn Orchestrator>> {
            Ok(Arc::new(self.clone()))
        }

        fn warehouse(&self, _secret: &SecretData) -> BillflowResult<Arc<dyn WarehouseRepository>> {
            Ok(Arc::new(self.clone()))
        }
    }

    fn test_state(backends: MockBackends, mode: DispatchMode) -> AppState {
        AppState {
            config: AppConfig {
                host: "127.0.0.1".into(),
                port: 0,
                log_level: "debug".into(),
                dispatch_mode: mode,
                http_timeout_secs: 5,
            },
            clock: Arc::new(FixedClock::at_date(2024, 3, 15).unwrap()),
            backends: Arc::new(backends),
            visibility: VisibilityPolicy {
                attempts: 1,
                base_backoff: Duration::from_millis(1),
                max_backoff: Duration::from_millis(1),
            },
        }
    }

    async fn read_body(resp: axum::http::Response<Body>) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn post(state: AppState, uri: &str, body: Value) -> (StatusCode, Value) {
        let resp = build_router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = resp.status();
        (status, read_body(resp).await)
    }

    fn linked(account_id: &str, is_sync: &str) -> Value {
        json!({
            "account_id": account_id,
            "name": format!("Account {account_id}"),
            "data_source_id": "ds-1",
            "v_workspace_id": "ws-1",
            "is_sync": is_sync,
        })
    }

    fn secret() -> Value {
        json!({ "project_id": "proj-1" })
    }

    // ── Health / Info ───────────────────────────────────────────────

    #[tokio::test]
    async fn health_returns_ok() {
        let app = build_router(test_state(MockBackends::default(), DispatchMode::Batch));
        let resp = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(read_body(resp).await, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn info_names_the_service() {
        let app = build_router(test_state(MockBackends::default(), DispatchMode::Batch));
        let resp = app
            .oneshot(Request::get("/info").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = read_body(resp).await;
        assert_eq!(body["name"], "billflow-plugin");
        assert!(body["instance_id"].is_string());
    }

    // ── job/get_tasks ───────────────────────────────────────────────

    #[tokio::test]
    async fn get_tasks_first_sync_records_and_dispatches_batch() {
        let backends = MockBackends::default();
        let state = test_state(backends.clone(), DispatchMode::Batch);

        let (status, body) = post(
            state,
            "/job/get_tasks",
            json!({
                "secret_data": secret(),
                "linked_accounts": [linked("111", "false")],
                "start": "2024-01",
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["tasks"],
            json!([{
                "task_options": {
                    "account_id": "111",
                    "name": "Account 111",
                    "data_source_id": "ds-1",
                    "v_workspace_id": "ws-1",
                    "start": "2024-01",
                    "date_range": ["2024-01", "2024-02", "2024-03"],
                }
            }])
        );
        assert_eq!(
            body["changed"],
            json!([{ "start": "2024-01", "account_id": "111" }, { "start": "2024-01" }])
        );

        let recorded = backends.recorded();
        assert_eq!(recorded.rows.len(), 1);
        assert_eq!(recorded.rows[0].created_at, "\"2024-03-15 00:00:00\"");
        assert_eq!(recorded.triggers.len(), 1);
        let (dag, conf) = &recorded.triggers[0];
        assert_eq!(dag, "cost_data_collector");
        let conf: Value = serde_json::from_str(conf).unwrap();
        assert_eq!(conf["111"]["start"], "2024-01");
    }

    #[tokio::test]
    async fn get_tasks_mixes_synced_and_new_accounts() {
        let backends = MockBackends::default();
        let (status, body) = post(
            test_state(backends, DispatchMode::Batch),
            "/job/get_tasks",
            json!({
                "secret_data": secret(),
                "linked_accounts": [linked("111", "true"), linked("222", "false")],
                "last_synchronized_at": "2024-03-05T00:00:00Z",
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tasks"][0]["task_options"]["start"], "2024-02");
        assert_eq!(body["tasks"][1]["task_options"]["start"], "2023-03");
        assert_eq!(
            body["changed"],
            json!([{ "start": "2023-03", "account_id": "222" }, { "start": "2024-02" }])
        );
    }

    #[tokio::test]
    async fn get_tasks_malformed_start_is_rejected_before_any_io() {
        let backends = MockBackends::default();
        let (status, body) = post(
            test_state(backends.clone(), DispatchMode::Batch),
            "/job/get_tasks",
            json!({
                "secret_data": secret(),
                "linked_accounts": [linked("111", "false")],
                "start": "2024",
            }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "ERROR_INVALID_PARAMETER");
        assert_eq!(backends.recorded().warehouse_calls, 0);
        assert!(backends.recorded().triggers.is_empty());
    }

    #[tokio::test]
    async fn get_tasks_future_start_keeps_change_records() {
        let backends = MockBackends::default();
        let (status, body) = post(
            test_state(backends.clone(), DispatchMode::Batch),
            "/job/get_tasks",
            json!({
                "secret_data": secret(),
                "linked_accounts": [linked("111", "false")],
                "start": "2024-06",
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tasks"], json!([]));
        assert_eq!(
            body["changed"],
            json!([{ "start": "2024-06", "account_id": "111" }, { "start": "2024-06" }])
        );
        assert!(backends.recorded().triggers.is_empty());
    }

    #[tokio::test]
    async fn get_tasks_unparseable_timestamp_is_invalid_parameter() {
        let backends = MockBackends::default();
        let (status, body) = post(
            test_state(backends.clone(), DispatchMode::Batch),
            "/job/get_tasks",
            json!({
                "secret_data": secret(),
                "linked_accounts": [linked("111", "true")],
                "last_synchronized_at": "yesterday",
            }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "ERROR_INVALID_PARAMETER");
        assert!(body["message"]
            .as_str()
            .unwrap()
            .contains("invalid last_synchronized_at"));
        assert_eq!(backends.recorded().warehouse_calls, 0);
    }

    #[tokio::test]
    async fn malformed_json_body_is_invalid_parameter() {
        let app = build_router(test_state(MockBackends::default(), DispatchMode::Batch));
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/cost/get_linked_accounts")
                    .header("content-type", "application/json")
                    .body(Body::from("{\"secret_data\": "))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = read_body(resp).await;
        assert_eq!(body["error"], "ERROR_INVALID_PARAMETER");
        assert!(body["message"].as_str().unwrap().starts_with("invalid parameter body"));
    }

    #[tokio::test]
    async fn wrongly_typed_field_is_invalid_parameter() {
        let (status, body) = post(
            test_state(MockBackends::default(), DispatchMode::Batch),
            "/job/get_tasks",
            json!({ "secret_data": secret(), "linked_accounts": "111" }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "ERROR_INVALID_PARAMETER");
    }

    #[tokio::test]
    async fn get_tasks_per_task_mode_only_records() {
        let backends = MockBackends::default();
        let (status, _) = post(
            test_state(backends.clone(), DispatchMode::PerTask),
            "/job/get_tasks",
            json!({
                "secret_data": secret(),
                "linked_accounts": [linked("111", "false")],
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(backends.recorded().rows.len(), 1);
        assert!(backends.recorded().triggers.is_empty());
    }

    #[tokio::test]
    async fn get_tasks_without_accounts_skips_dispatch() {
        let backends = MockBackends::default();
        let (status, body) = post(
            test_state(backends.clone(), DispatchMode::Batch),
            "/job/get_tasks",
            json!({ "secret_data": secret(), "start": "2024-02" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tasks"], json!([]));
        assert_eq!(body["changed"], json!([{ "start": "2024-02" }]));
        assert!(backends.recorded().triggers.is_empty());
    }

    #[tokio::test]
    async fn get_tasks_warehouse_fault_is_bad_gateway() {
        let backends = MockBackends {
            fail_warehouse: true,
            ..Default::default()
        };
        let (status, body) = post(
            test_state(backends.clone(), DispatchMode::Batch),
            "/job/get_tasks",
            json!({ "secret_data": secret(), "linked_accounts": [linked("111", "false")] }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "ERROR_WAREHOUSE");
        assert!(backends.recorded().triggers.is_empty());
    }

    #[tokio::test]
    async fn get_tasks_insert_errors_do_not_fail_the_job() {
        let backends = MockBackends {
            fail_insert: true,
            ..Default::default()
        };
        let (status, body) = post(
            test_state(backends.clone(), DispatchMode::Batch),
            "/job/get_tasks",
            json!({ "secret_data": secret(), "linked_accounts": [linked("111", "false")] }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tasks"].as_array().unwrap().len(), 1);
        assert_eq!(backends.recorded().triggers.len(), 1);
    }

    // ── cost/get_linked_accounts ────────────────────────────────────

    #[tokio::test]
    async fn linked_accounts_skip_entries_without_account_id() {
        let backends = MockBackends {
            accounts: vec![
                ServiceAccount {
                    service_account_id: Some("sa-1".into()),
                    name: "prod".into(),
                    data: ServiceAccountData {
                        account_id: Some("111".into()),
                    },
                    tags: serde_json::from_value(json!({ "env": "prod" })).unwrap(),
                },
                ServiceAccount {
                    service_account_id: Some("sa-2".into()),
                    name: "orphan".into(),
                    data: ServiceAccountData::default(),
                    tags: Default::default(),
                },
            ],
            ..Default::default()
        };

        let (status, body) = post(
            test_state(backends, DispatchMode::Batch),
            "/cost/get_linked_accounts",
            json!({ "secret_data": {}, "domain_id": "domain-1" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "results": [{ "account_id": "111", "name": "prod", "tags": { "env": "prod" } }] })
        );
    }

    // ── cost/get_data ───────────────────────────────────────────────

    fn task_options() -> Value {
        json!({
            "start": "2024-01",
            "account_id": "111",
            "data_source_id": "ds-1",
            "v_workspace_id": "ws-1",
            "domain_id": "domain-1",
        })
    }

    #[tokio::test]
    async fn get_data_reports_first_missing_field() {
        let mut options = task_options();
        options.as_object_mut().unwrap().remove("account_id");
        options.as_object_mut().unwrap().remove("domain_id");

        let (status, body) = post(
            test_state(MockBackends::default(), DispatchMode::PerTask),
            "/cost/get_data",
            json!({ "secret_data": secret(), "task_options": options }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "ERROR_REQUIRED_PARAMETER");
        assert_eq!(
            body["message"],
            "required parameter is missing: task_options.account_id"
        );
    }

    #[tokio::test]
    async fn get_data_per_task_triggers_with_expanded_range() {
        let backends = MockBackends::default();
        let (status, body) = post(
            test_state(backends.clone(), DispatchMode::PerTask),
            "/cost/get_data",
            json!({ "secret_data": secret(), "task_options": task_options() }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "results": [] }));

        let recorded = backends.recorded();
        assert_eq!(recorded.triggers.len(), 1);
        let conf: Value = serde_json::from_str(&recorded.triggers[0].1).unwrap();
        assert_eq!(conf["account_id"], "111");
        assert_eq!(conf["v_workspace_id"], "ws-1");
        assert_eq!(conf["date_range"], json!(["2024-01", "2024-02", "2024-03"]));
    }

    #[tokio::test]
    async fn get_data_batch_mode_only_validates() {
        let backends = MockBackends::default();
        let (status, _) = post(
            test_state(backends.clone(), DispatchMode::Batch),
            "/cost/get_data",
            json!({ "secret_data": secret(), "task_options": task_options() }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(backends.recorded().triggers.is_empty());
    }

    #[tokio::test]
    async fn get_data_future_start_skips_dispatch() {
        let backends = MockBackends::default();
        let mut options = task_options();
        options["start"] = json!("2024-06");

        let (status, body) = post(
            test_state(backends.clone(), DispatchMode::PerTask),
            "/cost/get_data",
            json!({ "secret_data": secret(), "task_options": options }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "results": [] }));
        assert!(backends.recorded().triggers.is_empty());
    }

    // ── data_source ─────────────────────────────────────────────────

    #[tokio::test]
    async fn init_returns_routing_metadata() {
        let (status, body) = post(
            test_state(MockBackends::default(), DispatchMode::Batch),
            "/data_source/init",
            json!({ "options": {} }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let metadata = &body["metadata"];
        assert_eq!(metadata["currency"], "USD");
        assert_eq!(metadata["supported_secret_types"], json!(["MANUAL"]));
        assert_eq!(metadata["use_account_routing"], true);
        let rule = &metadata["data_source_rules"][0];
        assert_eq!(rule["name"], "match_service_account");
        assert_eq!(
            rule["actions"]["match_service_account"],
            json!({ "source": "labels.Account ID", "target": "data.account_id" })
        );
        assert_eq!(rule["options"]["stop_processing"], true);
    }

    #[tokio::test]
    async fn verify_calls_directory() {
        let backends = MockBackends::default();
        let (status, _) = post(
            test_state(backends.clone(), DispatchMode::Batch),
            "/data_source/verify",
            json!({ "secret_data": {}, "domain_id": "domain-1" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(backends.recorded().verified, vec!["domain-1"]);
    }

    #[tokio::test]
    async fn verify_requires_domain_and_surfaces_rejection() {
        let (status, body) = post(
            test_state(MockBackends::default(), DispatchMode::Batch),
            "/data_source/verify",
            json!({ "secret_data": {} }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "required parameter is missing: domain_id");

        let backends = MockBackends {
            fail_verify: true,
            ..Default::default()
        };
        let (status, body) = post(
            test_state(backends, DispatchMode::Batch),
            "/data_source/verify",
            json!({ "secret_data": {}, "domain_id": "domain-1" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "ERROR_UPSTREAM");
    }
}
