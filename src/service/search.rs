//! Search orchestration: schema resolution, dialect execution, row
//! normalization, assembled into one call.

use std::sync::Arc;

use crate::config::PortalConfig;
use crate::domain::models::{FilterSet, ResultPage};
use crate::error::Result;
use crate::extractor::normalize;
use crate::service::executor::SearchExecutor;
use crate::service::http::{create_client, ClientKind};
use crate::service::schema::{FieldCatalog, SchemaResolver};

pub struct SearchService {
    config: PortalConfig,
    resolver: SchemaResolver,
    executor: SearchExecutor,
}

impl SearchService {
    pub fn new(config: PortalConfig) -> Result<Self> {
        Self::with_client_kind(config, ClientKind::from_env())
    }

    pub fn with_client_kind(config: PortalConfig, kind: ClientKind) -> Result<Self> {
        let client = create_client(kind)?;
        Ok(Self {
            resolver: SchemaResolver::new(client.clone(), config.clone()),
            executor: SearchExecutor::new(client, config.clone()),
            config,
        })
    }

    /// Run one search: resolve the field catalog (memoized), execute with
    /// dialect fallback, normalize every row.
    pub async fn search(&self, filters: &FilterSet) -> Result<ResultPage> {
        let fields = self.resolver.resolve().await?;
        let outcome = self.executor.execute(filters, &fields).await?;
        let items = outcome
            .rows
            .iter()
            .map(|row| normalize(row, &fields, &self.config))
            .collect();
        Ok(ResultPage {
            items,
            total: outcome.total,
            url: outcome.url,
            dialect: outcome.dialect,
        })
    }

    /// Force a fresh catalog fetch on the next (and this) resolution.
    pub async fn refresh_schema(&self) -> Result<Arc<FieldCatalog>> {
        self.resolver.refresh().await
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }
}
