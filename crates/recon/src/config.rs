use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::model::CatalogType;

/// Largest write batch the document store commits atomically.
pub const MAX_BATCH_SIZE: usize = 500;

/// Tenant assigned to legacy records without a tenant field.
pub const DEFAULT_TENANT: &str = "default-company";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconcileConfig {
    /// Collection holding catalog records.
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_type_field")]
    pub type_field: String,
    #[serde(default = "default_tenant_field")]
    pub tenant_field: String,
    #[serde(default = "default_value_field")]
    pub value_field: String,
    #[serde(default = "default_tenant")]
    pub default_tenant: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Wire names to process, in order. Unknown names are skipped at run time.
    #[serde(default = "default_types")]
    pub types: Vec<String>,
    /// Plan deletions without committing them.
    #[serde(default)]
    pub dry_run: bool,
}

fn default_collection() -> String {
    "templates".into()
}

fn default_type_field() -> String {
    "type".into()
}

fn default_tenant_field() -> String {
    "companyId".into()
}

fn default_value_field() -> String {
    "value".into()
}

fn default_tenant() -> String {
    DEFAULT_TENANT.into()
}

fn default_batch_size() -> usize {
    MAX_BATCH_SIZE
}

fn default_types() -> Vec<String> {
    CatalogType::ALL.iter().map(|t| t.wire_name().to_string()).collect()
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            type_field: default_type_field(),
            tenant_field: default_tenant_field(),
            value_field: default_value_field(),
            default_tenant: default_tenant(),
            batch_size: default_batch_size(),
            types: default_types(),
            dry_run: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconcileConfig {
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let config: ReconcileConfig =
            toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let input = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml(&input)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(ConfigError::Validation(format!(
                "batch_size must be between 1 and {MAX_BATCH_SIZE}, got {}",
                self.batch_size
            )));
        }

        for (name, field) in [
            ("collection", &self.collection),
            ("type_field", &self.type_field),
            ("tenant_field", &self.tenant_field),
            ("value_field", &self.value_field),
            ("default_tenant", &self.default_tenant),
        ] {
            if field.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{name} must not be empty")));
            }
        }

        Ok(())
    }

    /// Configured types split into known categories and unknown wire names.
    /// Duplicates in the list are processed once.
    pub fn resolve_types(&self) -> (Vec<CatalogType>, Vec<String>) {
        let mut known = Vec::new();
        let mut unknown = Vec::new();
        for name in &self.types {
            match CatalogType::from_wire_name(name) {
                Some(t) if !known.contains(&t) => known.push(t),
                Some(_) => {}
                None => unknown.push(name.clone()),
            }
        }
        (known, unknown)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
