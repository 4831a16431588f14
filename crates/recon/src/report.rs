use serde::Serialize;

use crate::error::ReconcileError;
use crate::model::{CatalogType, MalformedRecord};

// ---------------------------------------------------------------------------
// Per-category
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryStatus {
    Ok,
    PartialFailure,
    Failed,
    Cancelled,
}

impl std::fmt::Display for CategoryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::PartialFailure => write!(f, "partial_failure"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Counters for one category (or the whole run).
///
/// `kept` counts every record still in the store after the run, so
/// `seen == kept + deleted` holds whatever failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub seen: usize,
    pub groups: usize,
    pub kept: usize,
    pub deleted: usize,
    /// Deletions found but not committed (dry run or cancelled).
    pub planned: usize,
    pub failed_deletes: usize,
    pub malformed: usize,
    pub batches_committed: usize,
    pub batches_failed: usize,
}

impl Counts {
    pub fn add(&mut self, other: &Counts) {
        self.seen += other.seen;
        self.groups += other.groups;
        self.kept += other.kept;
        self.deleted += other.deleted;
        self.planned += other.planned;
        self.failed_deletes += other.failed_deletes;
        self.malformed += other.malformed;
        self.batches_committed += other.batches_committed;
        self.batches_failed += other.batches_failed;
    }

    pub fn is_conserved(&self) -> bool {
        self.seen == self.kept + self.deleted
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryReport {
    pub catalog_type: CatalogType,
    pub status: CategoryStatus,
    pub counts: Counts,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub malformed: Vec<MalformedRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ReconcileError>,
}

impl CategoryReport {
    pub fn new(catalog_type: CatalogType) -> Self {
        Self {
            catalog_type,
            status: CategoryStatus::Ok,
            counts: Counts::default(),
            malformed: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn cancelled(catalog_type: CatalogType) -> Self {
        Self {
            status: CategoryStatus::Cancelled,
            ..Self::new(catalog_type)
        }
    }
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    PartialFailure,
    Failure,
    Cancelled,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::PartialFailure => write!(f, "partial failure"),
            Self::Failure => write!(f, "failure"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub engine_version: String,
    pub run_at: String,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub meta: RunMeta,
    pub status: RunStatus,
    pub totals: Counts,
    pub categories: Vec<CategoryReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped_types: Vec<String>,
}

impl RunReport {
    pub fn category(&self, catalog_type: CatalogType) -> Option<&CategoryReport> {
        self.categories.iter().find(|c| c.catalog_type == catalog_type)
    }
}

/// Fold category reports into totals and an overall status.
pub fn summarize(categories: &[CategoryReport]) -> (Counts, RunStatus) {
    let mut totals = Counts::default();
    let mut ok = 0;
    let mut failed = 0;
    let mut partial = 0;
    let mut cancelled = 0;

    for c in categories {
        totals.add(&c.counts);
        match c.status {
            CategoryStatus::Ok => ok += 1,
            CategoryStatus::PartialFailure => partial += 1,
            CategoryStatus::Failed => failed += 1,
            CategoryStatus::Cancelled => cancelled += 1,
        }
    }

    let status = if cancelled > 0 {
        RunStatus::Cancelled
    } else if failed > 0 && ok == 0 && partial == 0 {
        RunStatus::Failure
    } else if failed > 0 || partial > 0 {
        RunStatus::PartialFailure
    } else {
        RunStatus::Success
    };

    (totals, status)
}
