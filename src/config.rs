//! Portal configuration.
//!
//! All knobs come from the environment so the same binary can target any
//! Opendatasoft portal hosting a BOAMP-shaped dataset:
//! - `ODS_BASE`: portal base URL (default: the public BOAMP portal)
//! - `DATASET_ID`: dataset slug (default: "boamp")
//! - `ODS_APIKEY`: optional API key for portals that require one
//! - `ALLOW_INSECURE_SSL`: "1"/"true" to skip TLS verification

use url::Url;

use crate::error::{AppError, Result};

pub const DEFAULT_BASE: &str = "https://boamp-datadila.opendatasoft.com";
pub const DEFAULT_DATASET: &str = "boamp";

#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub base: Url,
    pub dataset: String,
    pub apikey: Option<String>,
}

impl PortalConfig {
    pub fn new(base: &str, dataset: &str) -> Result<Self> {
        let trimmed = base.trim_end_matches('/');
        let base = Url::parse(trimmed).map_err(|e| AppError::InvalidUrl(format!("{trimmed}: {e}")))?;
        Ok(Self {
            base,
            dataset: dataset.to_string(),
            apikey: None,
        })
    }

    /// Build the configuration from environment variables, falling back to
    /// the public BOAMP portal.
    pub fn from_env() -> Result<Self> {
        let base = std::env::var("ODS_BASE").unwrap_or_else(|_| DEFAULT_BASE.to_string());
        let dataset = std::env::var("DATASET_ID").unwrap_or_else(|_| DEFAULT_DATASET.to_string());
        let mut config = Self::new(&base, &dataset)?;
        config.apikey = std::env::var("ODS_APIKEY").ok().filter(|k| !k.is_empty());
        Ok(config)
    }

    /// Base URL without trailing slash, for string composition.
    pub fn base_str(&self) -> &str {
        self.base.as_str().trim_end_matches('/')
    }

    /// Portal hostname, empty when the base URL has none.
    pub fn host(&self) -> &str {
        self.base.host_str().unwrap_or("")
    }
}

/// Interpret a query-string boolean value.
///
/// Accepts "on", "true", "1", "yes" as true (case-insensitive).
pub fn parse_flag(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "on" | "true" | "1" | "yes")
}
