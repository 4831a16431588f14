use serde::Serialize;
use thiserror::Error;

use crate::model::RecordId;

/// Failure reported by a [`DocumentStore`](crate::store::DocumentStore).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Transport failure: connection refused, DNS, timeout.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// Credentials rejected.
    #[error("store rejected credentials: {0}")]
    Unauthorized(String),
    /// Store answered with an error status (quota, permission, bad request).
    #[error("store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    /// Response body could not be decoded.
    #[error("cannot decode store response: {0}")]
    Decode(String),
}

/// Per-category failures recorded in the run report.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReconcileError {
    /// Fetch failed; nothing was deleted for the category.
    #[error("store unavailable: {reason}")]
    StoreUnavailable { reason: String },
    /// A delete batch did not apply.
    #[error("batch commit failed for {} record(s): {reason}", ids.len())]
    BatchCommitFailed { ids: Vec<RecordId>, reason: String },
    /// Store applied part of a batch it reported as atomic.
    #[error("store left {} record(s) undeleted", ids.len())]
    PartialDelete { ids: Vec<RecordId> },
}

/// Config parse / validation error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(String),
    #[error("config validation error: {0}")]
    Validation(String),
    #[error("IO error: {0}")]
    Io(String),
}
