//! Query execution with dialect fallback.
//!
//! The rich dialect goes first. A 4xx answer means this deployment rejects
//! the compiled expression, so the same filters are re-issued through the
//! legacy dialect. An *empty* rich answer under the training preset is
//! treated as suspect rather than authoritative (schema mismatches make the
//! whitelist silently match nothing) and probed through the legacy dialect
//! too. Transport faults and 5xx answers are surfaced as-is, with no
//! legacy attempt and no same-dialect retry.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use url::Url;

use crate::config::PortalConfig;
use crate::domain::models::{Dialect, FilterSet};
use crate::error::{AppError, Result};
use crate::service::query::{compile_legacy, compile_rich, QueryRequest};
use crate::service::schema::FieldCatalog;

/// One result row exactly as the portal returned it. The rich dialect
/// sends flat objects, the legacy dialect wraps the payload in a `fields`
/// sub-object next to `recordid`; accessors paper over the difference.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRow(pub Map<String, Value>);

impl RawRow {
    /// The payload object holding the notice's field values.
    pub fn payload(&self) -> &Map<String, Value> {
        match self.0.get("fields") {
            Some(Value::Object(fields)) => fields,
            _ => &self.0,
        }
    }

    /// Provider record id, whichever of the two id keys is present.
    pub fn record_id(&self) -> Option<String> {
        ["id", "recordid"].iter().find_map(|key| match self.0.get(*key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RichResponse {
    #[serde(default)]
    results: Vec<RawRow>,
    #[serde(default)]
    total_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct LegacyResponse {
    #[serde(default)]
    records: Vec<RawRow>,
    #[serde(default)]
    nhits: Option<u64>,
}

/// Raw rows plus diagnostics from whichever dialect answered.
#[derive(Debug)]
pub struct FetchOutcome {
    pub rows: Vec<RawRow>,
    pub total: Option<u64>,
    pub url: Url,
    pub dialect: Dialect,
}

pub struct SearchExecutor {
    client: Client,
    config: PortalConfig,
}

impl SearchExecutor {
    pub fn new(client: Client, config: PortalConfig) -> Self {
        Self { client, config }
    }

    /// Run one search, trying the rich dialect first.
    pub async fn execute(&self, filters: &FilterSet, fields: &FieldCatalog) -> Result<FetchOutcome> {
        let rich_url = QueryRequest::Rich(compile_rich(filters, fields)).to_url(&self.config);
        log::info!("[SEARCH] Rich dialect: {rich_url}");

        match self.fetch_rich(rich_url).await {
            Ok(outcome) if !outcome.rows.is_empty() => Ok(outcome),
            Ok(outcome) if filters.use_training => {
                log::debug!("[SEARCH] Empty result under training preset, probing legacy dialect");
                match self.fetch_legacy(filters, fields).await {
                    Ok(legacy) if !legacy.rows.is_empty() => Ok(legacy),
                    Ok(_) => Ok(outcome),
                    Err(e) => {
                        log::warn!("[SEARCH] Legacy probe failed ({e}), keeping rich empty result");
                        Ok(outcome)
                    }
                }
            }
            Ok(outcome) => Ok(outcome),
            Err(e) if e.is_client_error() => {
                log::warn!("[SEARCH] Rich dialect rejected the query ({e}), falling back to legacy");
                self.fetch_legacy(filters, fields).await
            }
            Err(e) => Err(e),
        }
    }

    async fn fetch_rich(&self, url: Url) -> Result<FetchOutcome> {
        let response: RichResponse = self.get_json(&url).await?;
        log::debug!(
            "[SEARCH] Rich dialect returned {} rows (total {:?})",
            response.results.len(),
            response.total_count
        );
        Ok(FetchOutcome {
            rows: response.results,
            total: response.total_count,
            url,
            dialect: Dialect::Rich,
        })
    }

    async fn fetch_legacy(&self, filters: &FilterSet, fields: &FieldCatalog) -> Result<FetchOutcome> {
        let url = QueryRequest::Legacy(compile_legacy(filters, fields)).to_url(&self.config);
        log::info!("[SEARCH] Legacy dialect: {url}");
        let response: LegacyResponse = self.get_json(&url).await?;
        log::debug!(
            "[SEARCH] Legacy dialect returned {} rows (nhits {:?})",
            response.records.len(),
            response.nhits
        );
        Ok(FetchOutcome {
            rows: response.records,
            total: response.nhits,
            url,
            dialect: Dialect::Legacy,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| AppError::transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if body.is_empty() {
                status.canonical_reason().unwrap_or("unexpected status").to_string()
            } else {
                body.chars().take(200).collect()
            };
            return Err(AppError::HttpStatus { status: status.as_u16(), message });
        }
        response.json::<T>().await.map_err(|e| AppError::decode(e.to_string()))
    }
}
