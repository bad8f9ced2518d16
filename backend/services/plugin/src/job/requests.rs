use billflow_tasks::{LinkedAccount, PluginOptions, SecretData};
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Deserializer};

#[derive(Debug, Deserialize)]
pub struct GetTasksRequest {
    #[serde(default)]
    pub options: PluginOptions,
    #[serde(default)]
    pub secret_data: SecretData,
    #[serde(default)]
    pub linked_accounts: Vec<LinkedAccount>,
    #[serde(default)]
    pub domain_id: Option<String>,
    /// Explicit `YYYY-MM` override of the sync cursor.
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub last_synchronized_at: Option<DateTime<FixedOffset>>,
}

/// RFC 3339, or an offset-less `YYYY-MM-DDTHH:MM:SS[.f]` read as UTC.
fn deserialize_timestamp<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<FixedOffset>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return Ok(None);
    };

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw.trim()) {
        return Ok(Some(ts));
    }
    NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| Some(naive.and_utc().fixed_offset()))
        .map_err(|e| serde::de::Error::custom(format!("invalid last_synchronized_at: {e}")))
}
