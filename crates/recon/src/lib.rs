//! `sitebook-recon`: duplicate catalog-record reconciliation engine.
//!
//! Pure engine crate: talks to the document store only through the
//! [`DocumentStore`] trait it is handed. No CLI or network dependencies.

pub mod config;
pub mod engine;
pub mod error;
pub mod group;
pub mod memory;
pub mod model;
pub mod report;
pub mod store;

pub use config::ReconcileConfig;
pub use engine::{run, CancelToken};
pub use error::{ConfigError, ReconcileError, StoreError};
pub use model::{CatalogRecord, CatalogType, RecordId};
pub use report::{CategoryReport, CategoryStatus, Counts, RunReport, RunStatus};
pub use store::{DeleteOutcome, DocumentStore};
