use anyhow::{Context, Result};
use async_trait::async_trait;
use skill_core::{ContextStore, EnrichmentError, TenantProfile};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Tenant profiles read from a JSON object keyed by product key
#[derive(Debug, Default)]
pub struct FileTenantStore {
    tenants: HashMap<String, TenantProfile>,
}

impl FileTenantStore {
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read tenant file {}", path.display()))?;
        let tenants: HashMap<String, TenantProfile> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse tenant file {}", path.display()))?;
        debug!(count = tenants.len(), "Loaded tenant profiles");
        Ok(Self { tenants })
    }
}

#[async_trait]
impl ContextStore for FileTenantStore {
    async fn resolve_tenant(
        &self,
        product_key: &str,
    ) -> Result<Option<TenantProfile>, EnrichmentError> {
        Ok(self.tenants.get(product_key).cloned())
    }
}
