//! Core domain types: search filters and canonical result records.

use chrono::{Days, NaiveDate};
use serde::Serialize;
use url::Url;

use crate::config::parse_flag;

// ====== Pagination bounds ======

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

// ====== Training perimeter ======
//
// Fixed filter bundle targeting training/apprenticeship notices: free-text
// terms, official training CPV codes, and the EU service category for
// professional training.

pub const TRAINING_TERMS: &[&str] = &[
    "formation",
    "\"formation professionnelle\"",
    "apprentissage",
    "\"formation continue\"",
    "\"actions de formation\"",
];

pub const TRAINING_CPV_WHITELIST: &[&str] = &[
    "80500000", // Services de formation
    "80510000", // Services de formation spécialisés
    "80533100", // Formation en technologies de l'information
    "80570000", // Services de formation continue
    "80000000", // Enseignement et formation générale
    "80553000", // Formation à distance
    "79632000", // Formation et conseil en gestion du personnel
    "79952000", // Organisation de séminaires / conférences
];

pub const TRAINING_SERVICE_CATEGORY: &str = "24";

// ====== Enums ======

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SortMode {
    Date,
    Deadline,
    Relevance,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Date => "date",
            SortMode::Deadline => "deadline",
            SortMode::Relevance => "relevance",
        }
    }

    /// Unknown values fall back to date ordering.
    pub fn parse(value: &str) -> Self {
        match value {
            "deadline" => SortMode::Deadline,
            "relevance" => SortMode::Relevance,
            _ => SortMode::Date,
        }
    }
}

/// Which of the portal's two query protocols answered a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Dialect {
    Rich,
    Legacy,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Rich => "explore-v2.1",
            Dialect::Legacy => "records-v1",
        }
    }
}

// ====== FilterSet ======

/// Immutable description of one search. Built once from the caller's
/// query-string-like parameters; the compiler and executor only read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSet {
    pub page: u32,
    pub page_size: u32,
    pub keywords: String,
    pub selected_buckets: Vec<String>,
    pub cpv_prefix: Option<String>,
    pub dept_codes: Vec<String>,
    pub buyer: Option<String>,
    pub natures: Vec<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub use_date: bool,
    pub sort: SortMode,
    pub use_training: bool,
}

impl Default for FilterSet {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            keywords: String::new(),
            selected_buckets: Vec::new(),
            cpv_prefix: None,
            dept_codes: Vec::new(),
            buyer: None,
            natures: Vec::new(),
            date_from: None,
            date_to: None,
            use_date: false,
            sort: SortMode::Date,
            use_training: true,
        }
    }
}

impl FilterSet {
    /// Assemble a FilterSet from query-string-like pairs.
    ///
    /// Recognized keys: `page`, `pageSize`, `q`, `cpvPrefix`, `buyer`,
    /// `deptCodes` (repeated or comma-separated), `nature` (repeated),
    /// `dateFrom`, `dateTo`, `useDate`, `useTraining`, `sort`,
    /// `selectedBucket` (repeated). Unknown keys are ignored.
    ///
    /// `useTraining` defaults to on when absent. When date filtering is
    /// active and a bound is missing, the window defaults to the last 90
    /// days through one year ahead.
    pub fn from_query_pairs(pairs: &[(String, String)]) -> Self {
        Self::from_query_pairs_at(pairs, chrono::Local::now().date_naive())
    }

    pub fn from_query_pairs_at(pairs: &[(String, String)], today: NaiveDate) -> Self {
        let mut filters = Self::default();
        let mut training_seen = false;
        let mut use_date_flag = false;

        for (key, value) in pairs {
            match key.as_str() {
                "page" => filters.page = value.parse().unwrap_or(1).max(1),
                "pageSize" => {
                    filters.page_size =
                        value.parse().unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
                }
                "q" => filters.keywords = value.trim().to_string(),
                "cpvPrefix" => {
                    filters.cpv_prefix =
                        Some(value.trim().to_string()).filter(|p| !p.is_empty())
                }
                "buyer" => {
                    filters.buyer = Some(value.trim().to_string()).filter(|b| !b.is_empty())
                }
                "deptCodes" => {
                    filters
                        .dept_codes
                        .extend(value.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from));
                }
                "nature" => {
                    if !value.trim().is_empty() {
                        filters.natures.push(value.trim().to_string());
                    }
                }
                "selectedBucket" => {
                    if !value.trim().is_empty() {
                        filters.selected_buckets.push(value.trim().to_string());
                    }
                }
                "dateFrom" => filters.date_from = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok(),
                "dateTo" => filters.date_to = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok(),
                "useDate" => use_date_flag = parse_flag(value),
                "useTraining" => {
                    training_seen = true;
                    filters.use_training = parse_flag(value);
                }
                "sort" => filters.sort = SortMode::parse(value),
                _ => {}
            }
        }

        if !training_seen {
            filters.use_training = true;
        }

        // Explicit bounds activate date filtering on their own.
        filters.use_date = use_date_flag || filters.date_from.is_some() || filters.date_to.is_some();
        if filters.use_date {
            if filters.date_from.is_none() {
                filters.date_from = today.checked_sub_days(Days::new(90));
            }
            if filters.date_to.is_none() {
                filters.date_to = today.checked_add_days(Days::new(365));
            }
        }

        filters
    }

    /// Zero-based record offset for the rich dialect's `offset` and the
    /// legacy dialect's `start`.
    pub fn offset(&self) -> u32 {
        (self.page - 1) * self.page_size
    }
}

// ====== Canonical record view ======

/// One procurement notice, normalized out of whatever row shape the portal
/// returned. `title` and `href` are always usable; everything else is
/// best-effort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedRecord {
    pub title: String,
    pub href: String,
    pub reference: Option<String>,
    pub date: Option<String>,
    pub deadline: Option<String>,
    pub buyer: Option<String>,
    pub buyer_address: Option<String>,
    pub departments: Vec<String>,
    pub cpv_codes: Vec<String>,
    pub description: Option<String>,
    pub budget: Option<String>,
    pub procedure: Option<String>,
    pub market_type: Option<String>,
    pub place: Option<String>,
}

/// One page of normalized results plus diagnostics: the total count when
/// the portal reported one, the exact URL requested, and which dialect
/// answered.
#[derive(Debug, Clone, Serialize)]
pub struct ResultPage {
    pub items: Vec<NormalizedRecord>,
    pub total: Option<u64>,
    #[serde(serialize_with = "serialize_url")]
    pub url: Url,
    pub dialect: Dialect,
}

fn serialize_url<S: serde::Serializer>(url: &Url, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(url.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    #[test]
    fn test_defaults() {
        let filters = FilterSet::from_query_pairs_at(&[], today());
        assert_eq!(filters.page, 1);
        assert_eq!(filters.page_size, DEFAULT_PAGE_SIZE);
        assert!(filters.use_training, "training preset defaults to on");
        assert!(!filters.use_date);
        assert_eq!(filters.sort, SortMode::Date);
    }

    #[test]
    fn test_training_opt_out() {
        let filters = FilterSet::from_query_pairs_at(&pairs(&[("useTraining", "0")]), today());
        assert!(!filters.use_training);
    }

    #[test]
    fn test_page_size_clamped() {
        let filters =
            FilterSet::from_query_pairs_at(&pairs(&[("pageSize", "500"), ("page", "0")]), today());
        assert_eq!(filters.page_size, MAX_PAGE_SIZE);
        assert_eq!(filters.page, 1);
    }

    #[test]
    fn test_dept_codes_csv_and_repeated() {
        let filters = FilterSet::from_query_pairs_at(
            &pairs(&[("deptCodes", "75, 92"), ("deptCodes", "93")]),
            today(),
        );
        assert_eq!(filters.dept_codes, vec!["75", "92", "93"]);
    }

    #[test]
    fn test_date_window_defaults_when_enabled() {
        let filters = FilterSet::from_query_pairs_at(&pairs(&[("useDate", "on")]), today());
        assert!(filters.use_date);
        assert_eq!(filters.date_from, NaiveDate::from_ymd_opt(2025, 3, 17));
        assert_eq!(filters.date_to, NaiveDate::from_ymd_opt(2026, 6, 15));
    }

    #[test]
    fn test_explicit_date_bound_activates_filtering() {
        let filters =
            FilterSet::from_query_pairs_at(&pairs(&[("dateFrom", "2025-01-01")]), today());
        assert!(filters.use_date);
        assert_eq!(filters.date_from, NaiveDate::from_ymd_opt(2025, 1, 1));
        assert!(filters.date_to.is_some(), "missing bound gets the default window");
    }

    #[test]
    fn test_offset() {
        let filters = FilterSet {
            page: 3,
            page_size: 20,
            ..Default::default()
        };
        assert_eq!(filters.offset(), 40);
    }

    #[test]
    fn test_sort_parse_unknown_falls_back_to_date() {
        assert_eq!(SortMode::parse("bogus"), SortMode::Date);
        assert_eq!(SortMode::parse("deadline"), SortMode::Deadline);
    }
}
