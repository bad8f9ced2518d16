use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct InitResponse {
    pub metadata: PluginMetadata,
}

#[derive(Debug, Serialize)]
pub struct PluginMetadata {
    pub currency: &'static str,
    pub supported_secret_types: Vec<&'static str>,
    pub data_source_rules: Vec<DataSourceRule>,
    pub use_account_routing: bool,
}

#[derive(Debug, Serialize)]
pub struct DataSourceRule {
    pub name: &'static str,
    pub conditions_policy: &'static str,
    pub actions: RuleActions,
    pub options: RuleOptions,
}

#[derive(Debug, Serialize)]
pub struct RuleActions {
    pub match_service_account: MatchServiceAccount,
}

#[derive(Debug, Serialize)]
pub struct MatchServiceAccount {
    pub source: &'static str,
    pub target: &'static str,
}

#[derive(Debug, Serialize)]
pub struct RuleOptions {
    pub stop_processing: bool,
}

impl PluginMetadata {
    /// Costs are USD; rows are routed to the service account whose
    /// `data.account_id` matches the row's `Account ID` label.
    pub fn cost_collector() -> Self {
        Self {
            currency: "USD",
            supported_secret_types: vec!["MANUAL"],
            data_source_rules: vec![DataSourceRule {
                name: "match_service_account",
                conditions_policy: "ALWAYS",
                actions: RuleActions {
                    match_service_account: MatchServiceAccount {
                        source: "labels.Account ID",
                        target: "data.account_id",
                    },
                },
                options: RuleOptions {
                    stop_processing: true,
                },
            }],
            use_account_routing: true,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {}
