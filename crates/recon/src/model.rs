use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Catalog types
// ---------------------------------------------------------------------------

/// Reference-data categories stored in the templates collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CatalogType {
    CostCategory,
    UnitOfMeasure,
    PaymentMethod,
    ProjectStatus,
    StockCategory,
    StockUnit,
}

impl CatalogType {
    /// The fixed category list, in processing order.
    pub const ALL: [CatalogType; 6] = [
        Self::CostCategory,
        Self::UnitOfMeasure,
        Self::PaymentMethod,
        Self::ProjectStatus,
        Self::StockCategory,
        Self::StockUnit,
    ];

    /// Value of the `type` field for records of this category.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::CostCategory => "boq_categories",
            Self::UnitOfMeasure => "boq_units",
            Self::PaymentMethod => "payment_methods",
            Self::ProjectStatus => "project_statuses",
            Self::StockCategory => "stock_categories",
            Self::StockUnit => "stock_units",
        }
    }

    /// Parse a wire name. Unknown names return `None` (callers skip them).
    pub fn from_wire_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.wire_name() == name)
    }
}

impl fmt::Display for CatalogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl Serialize for CatalogType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire_name())
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Store-assigned document id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One reference-data document as seen by the engine.
///
/// Only the fields the engine reads are decoded; everything else on the
/// document is left alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRecord {
    pub id: RecordId,
    pub catalog_type: CatalogType,
    /// Raw tenant field. `None` or empty on legacy records.
    pub tenant: Option<String>,
    /// Canonical value. `None` when missing, null, empty or non-scalar.
    pub value: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl CatalogRecord {
    pub fn new(id: impl Into<RecordId>, catalog_type: CatalogType) -> Self {
        Self {
            id: id.into(),
            catalog_type,
            tenant: None,
            value: None,
            created_at: None,
        }
    }

    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Tenant for grouping, falling back to `default_tenant`.
    pub fn tenant_or<'a>(&'a self, default_tenant: &'a str) -> &'a str {
        match self.tenant.as_deref() {
            Some(t) if !t.is_empty() => t,
            _ => default_tenant,
        }
    }

    /// The value, if it can take part in grouping.
    pub fn usable_value(&self) -> Option<&str> {
        self.value.as_deref().filter(|v| !v.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Group key = (tenant, value) within one catalog type. Never spans tenants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GroupKey {
    pub tenant: String,
    pub value: String,
}

/// Records sharing one key: the survivor plus everything to delete.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    pub key: GroupKey,
    pub survivor: RecordId,
    pub duplicates: Vec<RecordId>,
}

impl DuplicateGroup {
    pub fn len(&self) -> usize {
        1 + self.duplicates.len()
    }

    pub fn has_duplicates(&self) -> bool {
        !self.duplicates.is_empty()
    }
}

/// A record excluded from grouping because it has no usable value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MalformedRecord {
    pub id: RecordId,
    pub tenant: String,
    pub reason: &'static str,
}

/// Output of partitioning one category.
#[derive(Debug, Default)]
pub struct Partition {
    pub groups: Vec<DuplicateGroup>,
    pub malformed: Vec<MalformedRecord>,
    /// Listing entries dropped because their id was already listed.
    pub repeated: usize,
}

impl Partition {
    pub fn duplicate_count(&self) -> usize {
        self.groups.iter().map(|g| g.duplicates.len()).sum()
    }
}
