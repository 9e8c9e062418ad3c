//! Dataset schema resolution.
//!
//! Field names drift between portal deployments ("dateparution" here,
//! "date_publication" there). The resolver fetches the dataset's field
//! catalog once per process and maps each logical role to whichever
//! concrete name actually exists, falling back to a hard-coded default so
//! downstream query building never has to branch on "unresolved".

use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::PortalConfig;
use crate::error::{AppError, Result};

// Candidate column names per logical role, in resolution order.
const DATE_CANDIDATES: &[&str] = &[
    "dateparution",
    "date_publication",
    "datepublication",
    "date",
    "publication_date",
    "record_timestamp",
];
const TITLE_CANDIDATES: &[&str] = &["intitule", "objet", "titre", "title", "intitulé", "objet_du_marche"];
const URL_CANDIDATES: &[&str] = &[
    "url",
    "lien",
    "pageurl",
    "url_avis",
    "url_detail_avis",
    "avis_url",
    "link",
    "permalink",
    "permalien",
    "permalink_avis",
    "permalien_avis",
];
const CPV_CANDIDATES: &[&str] = &["cpv", "cpvs", "code_cpv", "codes_cpv", "cpv_principal"];
const DEPT_CANDIDATES: &[&str] = &[
    "lieu_execution_code",
    "code_departement",
    "departement",
    "code_dept",
    "dept",
    "code_insee_departement",
];
const BUYER_CANDIDATES: &[&str] =
    &["acheteur", "acheteur_nom", "acheteur_name", "organisme", "acheteur.principal"];
const DESCRIPTION_CANDIDATES: &[&str] = &["description", "objet", "objet_detail", "objetcomplet", "texte"];
const REF_CANDIDATES: &[&str] = &[
    "reference",
    "référence",
    "numero",
    "num_avis",
    "identifiant",
    "no_avis",
    "num_annonce",
    "id",
    "recordid",
];
const SERVICE_CATEGORY_CANDIDATES: &[&str] = &[
    "categorie_services",
    "categorie_service",
    "categorie",
    "categorie_de_services",
    "category_service",
    "service_category",
];
const NATURE_CANDIDATES: &[&str] = &["nature", "nature_avis", "type_avis", "type", "etat", "etat_avis"];
const DEADLINE_CANDIDATES: &[&str] = &[
    "date_limite_remise_offres",
    "date_limite_de_reception_des_offres",
    "date_limite_offres",
    "date_reception_offres",
    "date_reponse",
    "date_limite",
    "date_depot_offre",
    "deadline",
];
const BUYER_ADDRESS_CANDIDATES: &[&str] = &[
    "nom_et_adresse_officiels_de_l_organisme_acheteur",
    "nom_et_adresse_officiels_de_lorganisme_acheteur",
    "acheteur_adresse",
    "adresse_acheteur",
    "organisme_adresse",
    "acheteur_coordonnees",
    "coordonnees_acheteur",
    "adresse",
];
const BUDGET_CANDIDATES: &[&str] = &["montant", "montant_estime", "valeur", "budget", "amount"];
const PROCEDURE_CANDIDATES: &[&str] =
    &["procedure", "type_procedure", "mode_de_passation", "procedure_type"];
const MARKET_TYPE_CANDIDATES: &[&str] = &["type_marche", "type_du_marche", "type"];
const PLACE_CANDIDATES: &[&str] = &[
    "lieu_execution",
    "lieu_execution_nom",
    "lieu_dexecution",
    "localisation",
    "ville",
    "commune",
];

/// Concrete column names for the sixteen logical roles of a notice record.
///
/// Every role always holds some name; `Default` is the fallback table used
/// when a role has no match in the live catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCatalog {
    pub date: String,
    pub title: String,
    pub url: String,
    pub cpv: String,
    pub dept: String,
    pub buyer: String,
    pub description: String,
    pub reference: String,
    pub service_category: String,
    pub nature: String,
    pub deadline: String,
    pub buyer_address: String,
    pub budget: String,
    pub procedure: String,
    pub market_type: String,
    pub place: String,
}

impl Default for FieldCatalog {
    fn default() -> Self {
        Self {
            date: "record_timestamp".into(),
            title: "title".into(),
            url: "permalink".into(),
            cpv: "cpv".into(),
            dept: "departement".into(),
            buyer: "acheteur".into(),
            description: "description".into(),
            reference: "id".into(),
            service_category: "categorie_services".into(),
            nature: "nature".into(),
            deadline: "date_limite_remise_offres".into(),
            buyer_address: "nom_et_adresse_officiels_de_l_organisme_acheteur".into(),
            budget: "montant".into(),
            procedure: "procedure".into(),
            market_type: "type_marche".into(),
            place: "lieu_execution".into(),
        }
    }
}

impl FieldCatalog {
    /// Map every role to the first candidate present in `names`, keeping
    /// the default when none matches.
    pub fn resolve(names: &[String]) -> Self {
        let pick = |candidates: &[&str], fallback: &str| -> String {
            candidates
                .iter()
                .find(|c| names.iter().any(|n| n == *c))
                .map(|c| c.to_string())
                .unwrap_or_else(|| fallback.to_string())
        };
        let defaults = Self::default();
        Self {
            date: pick(DATE_CANDIDATES, &defaults.date),
            title: pick(TITLE_CANDIDATES, &defaults.title),
            url: pick(URL_CANDIDATES, &defaults.url),
            cpv: pick(CPV_CANDIDATES, &defaults.cpv),
            dept: pick(DEPT_CANDIDATES, &defaults.dept),
            buyer: pick(BUYER_CANDIDATES, &defaults.buyer),
            description: pick(DESCRIPTION_CANDIDATES, &defaults.description),
            reference: pick(REF_CANDIDATES, &defaults.reference),
            service_category: pick(SERVICE_CATEGORY_CANDIDATES, &defaults.service_category),
            nature: pick(NATURE_CANDIDATES, &defaults.nature),
            deadline: pick(DEADLINE_CANDIDATES, &defaults.deadline),
            buyer_address: pick(BUYER_ADDRESS_CANDIDATES, &defaults.buyer_address),
            budget: pick(BUDGET_CANDIDATES, &defaults.budget),
            procedure: pick(PROCEDURE_CANDIDATES, &defaults.procedure),
            market_type: pick(MARKET_TYPE_CANDIDATES, &defaults.market_type),
            place: pick(PLACE_CANDIDATES, &defaults.place),
        }
    }
}

// Catalog endpoint response, `{"dataset": {"fields": [{"name": ...}]}}`.
#[derive(Debug, Deserialize)]
struct CatalogResponse {
    dataset: Option<DatasetMeta>,
}

#[derive(Debug, Deserialize)]
struct DatasetMeta {
    #[serde(default)]
    fields: Vec<FieldMeta>,
}

#[derive(Debug, Deserialize)]
struct FieldMeta {
    name: String,
}

/// Fetches and memoizes the resolved field catalog for the process
/// lifetime.
///
/// The memo mutex is held across the network fetch, so concurrent first
/// callers share one in-flight resolution instead of issuing duplicate
/// requests. A failed fetch leaves the memo empty and the next call starts
/// over.
pub struct SchemaResolver {
    client: Client,
    config: PortalConfig,
    cache: Mutex<Option<Arc<FieldCatalog>>>,
}

impl SchemaResolver {
    pub fn new(client: Client, config: PortalConfig) -> Self {
        Self {
            client,
            config,
            cache: Mutex::new(None),
        }
    }

    /// Resolved catalog, from the memo when available.
    pub async fn resolve(&self) -> Result<Arc<FieldCatalog>> {
        let mut cache = self.cache.lock().await;
        if let Some(catalog) = cache.as_ref() {
            return Ok(catalog.clone());
        }
        let names = self.fetch_field_names().await?;
        log::debug!("[SCHEMA] Catalog lists {} fields", names.len());
        let catalog = Arc::new(FieldCatalog::resolve(&names));
        *cache = Some(catalog.clone());
        Ok(catalog)
    }

    /// Drop the memo and resolve again from the live catalog.
    pub async fn refresh(&self) -> Result<Arc<FieldCatalog>> {
        {
            let mut cache = self.cache.lock().await;
            *cache = None;
        }
        self.resolve().await
    }

    async fn fetch_field_names(&self) -> Result<Vec<String>> {
        let mut url = self.config.base.clone();
        url.set_path(&format!("api/v2/catalog/datasets/{}", self.config.dataset));
        if let Some(key) = &self.config.apikey {
            url.query_pairs_mut().append_pair("apikey", key);
        }
        log::info!("[SCHEMA] Fetching field catalog: {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| AppError::schema(format!("catalog fetch failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::schema(format!("catalog fetch returned HTTP {status}")));
        }
        let parsed: CatalogResponse = response
            .json()
            .await
            .map_err(|e| AppError::schema(format!("catalog body unreadable: {e}")))?;

        Ok(parsed
            .dataset
            .map(|d| d.fields.into_iter().map(|f| f.name).collect())
            .unwrap_or_default())
    }
}
