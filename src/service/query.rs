//! Query compilation.
//!
//! One FilterSet compiles into either of the portal's two dialects: the
//! rich Explore v2.1 API (free boolean `where` expression) or the legacy
//! Records v1 API (independent `refine.field=value` constraints). Both
//! compilers are pure and total; absent filters simply produce absent
//! clauses.

use serde::Serialize;
use url::Url;

use crate::config::PortalConfig;
use crate::domain::catalog::bucket_terms;
use crate::domain::models::{
    FilterSet, SortMode, TRAINING_CPV_WHITELIST, TRAINING_SERVICE_CATEGORY, TRAINING_TERMS,
};
use crate::service::schema::FieldCatalog;

/// Explore v2.1 request descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RichQuery {
    pub q: Option<String>,
    pub where_expr: Option<String>,
    pub order_by: String,
    pub limit: u32,
    pub offset: u32,
}

/// Records v1 request descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegacyQuery {
    pub q: Option<String>,
    pub refinements: Vec<(String, String)>,
    pub rows: u32,
    pub start: u32,
}

/// A request against one of the two dialects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum QueryRequest {
    Rich(RichQuery),
    Legacy(LegacyQuery),
}

impl QueryRequest {
    /// Full request URL including the dialect's endpoint path. Parameter
    /// encoding is handled by the URL serializer.
    pub fn to_url(&self, config: &PortalConfig) -> Url {
        let mut url = config.base.clone();
        match self {
            QueryRequest::Rich(query) => {
                url.set_path(&format!(
                    "api/explore/v2.1/catalog/datasets/{}/records",
                    config.dataset
                ));
                let mut pairs = url.query_pairs_mut();
                if let Some(q) = &query.q {
                    pairs.append_pair("q", q);
                }
                if let Some(where_expr) = &query.where_expr {
                    pairs.append_pair("where", where_expr);
                }
                pairs.append_pair("order_by", &query.order_by);
                pairs.append_pair("limit", &query.limit.to_string());
                pairs.append_pair("offset", &query.offset.to_string());
                if let Some(key) = &config.apikey {
                    pairs.append_pair("apikey", key);
                }
            }
            QueryRequest::Legacy(query) => {
                url.set_path("api/records/1.0/search/");
                let mut pairs = url.query_pairs_mut();
                pairs.append_pair("dataset", &config.dataset);
                pairs.append_pair("rows", &query.rows.to_string());
                pairs.append_pair("start", &query.start.to_string());
                if let Some(q) = &query.q {
                    pairs.append_pair("q", q);
                }
                for (field, value) in &query.refinements {
                    pairs.append_pair(&format!("refine.{field}"), value);
                }
                if let Some(key) = &config.apikey {
                    pairs.append_pair("apikey", key);
                }
            }
        }
        url
    }
}

// Sole injection defense for the rich dialect: every literal interpolated
// into the where expression goes through here.
fn escape_quotes(value: &str) -> String {
    value.replace('\'', "''")
}

fn like_fragment(field: &str, value: &str) -> String {
    format!("string({field}) LIKE '%{}%'", escape_quotes(value))
}

/// Free-text `q`: manual keywords, selected bucket terms, and (with the
/// training preset) the fixed training disjunction, OR-joined at the
/// keyword-language level.
fn compose_keywords(filters: &FilterSet) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    if !filters.keywords.trim().is_empty() {
        parts.push(filters.keywords.trim().to_string());
    }
    let bucket_expr = filters
        .selected_buckets
        .iter()
        .flat_map(|name| bucket_terms(name).iter().copied())
        .collect::<Vec<_>>()
        .join(" OR ");
    if !bucket_expr.is_empty() {
        parts.push(bucket_expr);
    }
    if filters.use_training {
        parts.push(TRAINING_TERMS.join(" OR "));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" OR "))
    }
}

/// Compile a FilterSet for the Explore v2.1 dialect.
pub fn compile_rich(filters: &FilterSet, fields: &FieldCatalog) -> RichQuery {
    let q = compose_keywords(filters);
    let mut clauses: Vec<String> = Vec::new();

    // The training whitelist and the free-form prefix are mutually
    // exclusive; whitelist wins.
    if filters.use_training {
        let parts: Vec<String> = TRAINING_CPV_WHITELIST
            .iter()
            .map(|code| like_fragment(&fields.cpv, code))
            .collect();
        clauses.push(format!("({})", parts.join(" OR ")));
    } else if let Some(prefix) = filters.cpv_prefix.as_deref().filter(|p| !p.trim().is_empty()) {
        let prefix = escape_quotes(prefix.trim());
        clauses.push(format!(
            "(string({f}) LIKE '{prefix}%' OR string({f}) LIKE '%{prefix}%')",
            f = fields.cpv
        ));
    }

    if !filters.dept_codes.is_empty() {
        let in_list = filters
            .dept_codes
            .iter()
            .map(|code| format!("'{}'", escape_quotes(code)))
            .collect::<Vec<_>>()
            .join(",");
        clauses.push(format!("({} IN ({in_list}))", fields.dept));
    }

    if let Some(buyer) = filters.buyer.as_deref().filter(|b| !b.trim().is_empty()) {
        clauses.push(like_fragment(&fields.buyer, buyer.trim()));
    }

    if filters.use_training {
        clauses.push(format!(
            "{} = '{}'",
            fields.service_category,
            escape_quotes(TRAINING_SERVICE_CATEGORY)
        ));
    }

    if !filters.natures.is_empty() {
        let values = filters
            .natures
            .iter()
            .filter(|v| !v.trim().is_empty())
            .map(|v| format!("'{}'", escape_quotes(v.trim())))
            .collect::<Vec<_>>();
        if !values.is_empty() {
            clauses.push(format!("string({}) IN ({})", fields.nature, values.join(",")));
        }
    }

    if filters.use_date {
        if let Some(from) = filters.date_from {
            clauses.push(format!("{} >= '{}'", fields.date, from.format("%Y-%m-%d")));
        }
        if let Some(to) = filters.date_to {
            clauses.push(format!("{} <= '{}'", fields.date, to.format("%Y-%m-%d")));
        }
    }

    let order_by = match filters.sort {
        SortMode::Deadline => format!("-{}", fields.deadline),
        SortMode::Relevance if q.is_some() => "relevance".to_string(),
        _ => format!("-{}", fields.date),
    };

    RichQuery {
        q,
        where_expr: if clauses.is_empty() { None } else { Some(clauses.join(" AND ")) },
        order_by,
        limit: filters.page_size,
        offset: filters.offset(),
    }
}

/// Compile a FilterSet for the Records v1 dialect.
///
/// This dialect has no boolean expressions: each refinement is an
/// independent constraint the portal ANDs together. Prefix matching,
/// buyer-substring semantics, nature sets and date bounds cannot be
/// expressed and are dropped rather than approximated badly.
pub fn compile_legacy(filters: &FilterSet, fields: &FieldCatalog) -> LegacyQuery {
    let mut refinements: Vec<(String, String)> = Vec::new();

    if filters.use_training {
        for code in TRAINING_CPV_WHITELIST {
            refinements.push((fields.cpv.clone(), code.to_string()));
        }
        refinements.push((fields.service_category.clone(), TRAINING_SERVICE_CATEGORY.to_string()));
    }

    for code in &filters.dept_codes {
        refinements.push((fields.dept.clone(), code.clone()));
    }

    if let Some(buyer) = filters.buyer.as_deref().filter(|b| !b.trim().is_empty()) {
        refinements.push((fields.buyer.clone(), buyer.trim().to_string()));
    }

    LegacyQuery {
        q: compose_keywords(filters),
        refinements,
        rows: filters.page_size,
        start: filters.offset(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_filters() -> FilterSet {
        FilterSet {
            use_training: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_compilers_are_deterministic() {
        let filters = FilterSet {
            keywords: "réseaux".into(),
            dept_codes: vec!["75".into()],
            ..Default::default()
        };
        let fields = FieldCatalog::default();
        assert_eq!(compile_rich(&filters, &fields), compile_rich(&filters, &fields));
        assert_eq!(compile_legacy(&filters, &fields), compile_legacy(&filters, &fields));
    }

    #[test]
    fn test_empty_filters_produce_no_clauses() {
        let query = compile_rich(&plain_filters(), &FieldCatalog::default());
        assert_eq!(query.q, None);
        assert_eq!(query.where_expr, None);
        assert_eq!(query.order_by, "-record_timestamp");
        assert_eq!(query.limit, 20);
        assert_eq!(query.offset, 0);
    }

    #[test]
    fn test_dept_in_clause_shape() {
        let filters = FilterSet {
            dept_codes: vec!["75".into(), "92".into()],
            ..plain_filters()
        };
        let query = compile_rich(&filters, &FieldCatalog::default());
        assert_eq!(query.where_expr.unwrap(), "(departement IN ('75','92'))");
    }

    #[test]
    fn test_quotes_are_doubled_everywhere() {
        let filters = FilterSet {
            buyer: Some("Val d'Oise habitat".into()),
            dept_codes: vec!["9'5".into()],
            natures: vec!["l'attribution".into()],
            ..plain_filters()
        };
        let expr = compile_rich(&filters, &FieldCatalog::default()).where_expr.unwrap();
        assert!(expr.contains("Val d''Oise habitat"));
        assert!(expr.contains("'9''5'"));
        assert!(expr.contains("'l''attribution'"));
        // No lone quote may survive: strip the doubled ones and the
        // delimiters must balance.
        let residue = expr.replace("''", "");
        assert_eq!(residue.matches('\'').count() % 2, 0, "unbalanced quote in {expr}");
    }

    #[test]
    fn test_training_whitelist_wins_over_prefix() {
        let filters = FilterSet {
            use_training: true,
            cpv_prefix: Some("4521".into()),
            ..Default::default()
        };
        let expr = compile_rich(&filters, &FieldCatalog::default()).where_expr.unwrap();
        assert!(expr.contains("string(cpv) LIKE '%80500000%'"));
        assert!(!expr.contains("4521"), "prefix must be ignored while training is on");
        assert!(expr.contains("categorie_services = '24'"));
    }

    #[test]
    fn test_cpv_prefix_starts_with_or_contains() {
        let filters = FilterSet {
            cpv_prefix: Some("4521".into()),
            ..plain_filters()
        };
        let expr = compile_rich(&filters, &FieldCatalog::default()).where_expr.unwrap();
        assert_eq!(expr, "(string(cpv) LIKE '4521%' OR string(cpv) LIKE '%4521%')");
    }

    #[test]
    fn test_date_clauses_respect_toggle() {
        let mut filters = FilterSet {
            date_from: chrono::NaiveDate::from_ymd_opt(2025, 1, 1),
            date_to: chrono::NaiveDate::from_ymd_opt(2025, 3, 1),
            use_date: false,
            ..plain_filters()
        };
        let query = compile_rich(&filters, &FieldCatalog::default());
        assert_eq!(query.where_expr, None, "toggle off suppresses stored bounds");

        filters.use_date = true;
        let expr = compile_rich(&filters, &FieldCatalog::default()).where_expr.unwrap();
        assert_eq!(
            expr,
            "record_timestamp >= '2025-01-01' AND record_timestamp <= '2025-03-01'"
        );
    }

    #[test]
    fn test_training_terms_or_appended_to_keywords() {
        let filters = FilterSet {
            keywords: "boulangerie".into(),
            use_training: true,
            ..Default::default()
        };
        let q = compile_rich(&filters, &FieldCatalog::default()).q.unwrap();
        assert!(q.starts_with("boulangerie OR formation OR"));
        assert!(q.contains("\"formation continue\""));
    }

    #[test]
    fn test_bucket_terms_join_keywords() {
        let filters = FilterSet {
            selected_buckets: vec!["Dev Web".into()],
            ..plain_filters()
        };
        let q = compile_rich(&filters, &FieldCatalog::default()).q.unwrap();
        assert!(q.contains("JavaScript OR TypeScript"));
    }

    #[test]
    fn test_sort_rules() {
        let fields = FieldCatalog::default();
        let deadline = FilterSet { sort: SortMode::Deadline, ..plain_filters() };
        assert_eq!(compile_rich(&deadline, &fields).order_by, "-date_limite_remise_offres");

        // Relevance needs keywords; without them it degrades to date.
        let relevance_empty = FilterSet { sort: SortMode::Relevance, ..plain_filters() };
        assert_eq!(compile_rich(&relevance_empty, &fields).order_by, "-record_timestamp");

        let relevance = FilterSet {
            sort: SortMode::Relevance,
            keywords: "formation".into(),
            ..plain_filters()
        };
        assert_eq!(compile_rich(&relevance, &fields).order_by, "relevance");
    }

    #[test]
    fn test_pagination_maps_to_limit_offset() {
        let filters = FilterSet { page: 3, page_size: 50, ..plain_filters() };
        let query = compile_rich(&filters, &FieldCatalog::default());
        assert_eq!(query.limit, 50);
        assert_eq!(query.offset, 100);
    }

    #[test]
    fn test_legacy_drops_inexpressible_filters() {
        let filters = FilterSet {
            cpv_prefix: Some("4521".into()),
            natures: vec!["AppelOffre".into()],
            date_from: chrono::NaiveDate::from_ymd_opt(2025, 1, 1),
            use_date: true,
            dept_codes: vec!["75".into()],
            ..plain_filters()
        };
        let query = compile_legacy(&filters, &FieldCatalog::default());
        assert_eq!(query.refinements, vec![("departement".to_string(), "75".to_string())]);
    }

    #[test]
    fn test_legacy_training_refinements() {
        let filters = FilterSet::default();
        let query = compile_legacy(&filters, &FieldCatalog::default());
        let cpv_refines = query.refinements.iter().filter(|(f, _)| f == "cpv").count();
        assert_eq!(cpv_refines, TRAINING_CPV_WHITELIST.len());
        assert!(query
            .refinements
            .contains(&("categorie_services".to_string(), "24".to_string())));
    }

    #[test]
    fn test_legacy_url_scenario() {
        let config = PortalConfig::new("https://portal.example.com", "boamp").unwrap();
        let filters = FilterSet { page: 1, page_size: 20, ..Default::default() };
        let query = QueryRequest::Legacy(compile_legacy(&filters, &FieldCatalog::default()));
        let url = query.to_url(&config);
        assert!(url.as_str().starts_with(
            "https://portal.example.com/api/records/1.0/search/?dataset=boamp&rows=20&start=0"
        ));
    }

    #[test]
    fn test_rich_url_contains_encoded_where() {
        let config = PortalConfig::new("https://portal.example.com", "boamp").unwrap();
        let filters = FilterSet { dept_codes: vec!["75".into()], ..plain_filters() };
        let query = QueryRequest::Rich(compile_rich(&filters, &FieldCatalog::default()));
        let url = query.to_url(&config);
        assert!(url
            .as_str()
            .starts_with("https://portal.example.com/api/explore/v2.1/catalog/datasets/boamp/records?"));
        let (_, where_value) = url.query_pairs().find(|(k, _)| k == "where").unwrap();
        assert_eq!(where_value, "(departement IN ('75'))");
    }
}
