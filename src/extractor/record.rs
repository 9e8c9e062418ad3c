//! Row normalization.
//!
//! Provider rows come in whatever shape the answering dialect and dataset
//! revision produced. Every field goes through the same lookup: resolved
//! column name first, then a short list of commonly-seen alternates, then
//! nothing. Normalization is total: bad or missing data degrades to
//! `None` (or a synthesized title/URL), never to an error.

use serde_json::{Map, Value};

use crate::config::PortalConfig;
use crate::domain::models::NormalizedRecord;
use crate::service::executor::RawRow;
use crate::service::schema::FieldCatalog;

/// Rendering cap for array-valued fields (multiple CPV codes, multiple
/// departments). Keeps a pathological row from blowing up the view.
pub const MAX_LIST_VALUES: usize = 3;

const TITLE_ALTERNATES: &[&str] = &["objet", "titre", "title"];
const URL_ALTERNATES: &[&str] =
    &["permalink", "url_avis", "pageurl", "lien", "link", "url", "permalien"];
const DATE_ALTERNATES: &[&str] = &["record_timestamp"];

/// Shared role lookup: primary resolved name, then alternates. Null and
/// empty-string values count as absent.
fn lookup<'a>(payload: &'a Map<String, Value>, primary: &str, alternates: &[&str]) -> Option<&'a Value> {
    std::iter::once(primary)
        .chain(alternates.iter().copied())
        .filter_map(|name| payload.get(name))
        .find(|v| !matches!(v, Value::Null) && !matches!(v, Value::String(s) if s.is_empty()))
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => items.first().and_then(|v| text(Some(v))),
        _ => None,
    }
}

fn text_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| text(Some(v)))
            .take(MAX_LIST_VALUES)
            .collect(),
        other => text(other).into_iter().collect(),
    }
}

// Timestamps truncate to their calendar date; no timezone conversion.
fn iso_date(value: Option<&Value>) -> Option<String> {
    text(value).map(|s| s.chars().take(10).collect())
}

/// Stable detail-page URL for a record.
///
/// The provider's own URL field is not trusted when it is empty, equals the
/// portal root, or points at the generic landing page; the chain then
/// prefers the boamp.fr canonical detail path (when the portal is a
/// boamp.fr host and a reference exists), then the dataset record page,
/// then the portal root. Unparseable URLs count as absent.
fn detail_url(
    config: &PortalConfig,
    raw_url: Option<&str>,
    reference: Option<&str>,
    record_id: Option<&str>,
) -> String {
    let base = config.base_str();
    let is_boamp_portal = config.host().ends_with("boamp.fr");

    let fallback = || -> String {
        if is_boamp_portal {
            if let Some(r) = reference {
                return format!("{base}/avis/detail/{r}");
            }
        }
        match record_id {
            Some(id) => {
                let mut url = config.base.clone();
                url.set_path(&format!("explore/dataset/{}/record/", config.dataset));
                url.query_pairs_mut().append_pair("id", id);
                url.to_string()
            }
            None => base.to_string(),
        }
    };

    let Some(raw) = raw_url.filter(|r| !r.trim().is_empty()) else {
        return fallback();
    };
    // join() resolves relative links against the portal base.
    let Ok(href) = config.base.join(raw) else {
        return fallback();
    };
    let href = href.to_string();
    if href == format!("{base}/") || href.contains("/pages/entreprise-accueil") {
        return fallback();
    }
    href
}

/// Map one raw row into the canonical record view.
pub fn normalize(row: &RawRow, fields: &FieldCatalog, config: &PortalConfig) -> NormalizedRecord {
    let payload = row.payload();
    let record_id = row.record_id();

    let reference =
        text(lookup(payload, &fields.reference, &[])).or_else(|| record_id.clone());

    let title = text(lookup(payload, &fields.title, TITLE_ALTERNATES)).unwrap_or_else(|| {
        format!("Avis #{}", record_id.as_deref().unwrap_or("?"))
    });

    let raw_url = text(lookup(payload, &fields.url, URL_ALTERNATES));
    let href = detail_url(config, raw_url.as_deref(), reference.as_deref(), record_id.as_deref());

    NormalizedRecord {
        title,
        href,
        reference,
        date: iso_date(lookup(payload, &fields.date, DATE_ALTERNATES)),
        deadline: iso_date(lookup(payload, &fields.deadline, &[])),
        buyer: text(lookup(payload, &fields.buyer, &[])),
        buyer_address: text(lookup(payload, &fields.buyer_address, &[])),
        departments: text_list(lookup(payload, &fields.dept, &[])),
        cpv_codes: text_list(lookup(payload, &fields.cpv, &[])),
        description: text(lookup(payload, &fields.description, &[])),
        budget: text(lookup(payload, &fields.budget, &[])),
        procedure: text(lookup(payload, &fields.procedure, &[])),
        market_type: text(lookup(payload, &fields.market_type, &[])),
        place: text(lookup(payload, &fields.place, &[])),
    }
}
