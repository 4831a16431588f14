//! Document store seam.
//!
//! The engine never talks to a database directly. Callers construct a
//! concrete client and pass it in; tests use [`MemoryStore`](crate::memory::MemoryStore).

use crate::error::StoreError;
use crate::model::{CatalogRecord, CatalogType, RecordId};

/// Result of committing one delete batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Every id in the batch was deleted.
    Committed,
    /// The store applied the batch but kept some documents.
    Partial { not_deleted: Vec<RecordId> },
}

pub trait DocumentStore {
    /// All records of one category. The returned order carries no meaning.
    fn list_records(&self, catalog_type: CatalogType) -> Result<Vec<CatalogRecord>, StoreError>;

    /// Delete `ids` as one atomic write. `Err` means nothing was applied.
    /// `ids.len()` never exceeds [`max_batch_size`](Self::max_batch_size).
    fn delete_batch(&self, ids: &[RecordId]) -> Result<DeleteOutcome, StoreError>;

    /// Largest batch the store commits atomically.
    fn max_batch_size(&self) -> usize;
}

impl<S: DocumentStore + ?Sized> DocumentStore for &S {
    fn list_records(&self, catalog_type: CatalogType) -> Result<Vec<CatalogRecord>, StoreError> {
        (**self).list_records(catalog_type)
    }

    fn delete_batch(&self, ids: &[RecordId]) -> Result<DeleteOutcome, StoreError> {
        (**self).delete_batch(ids)
    }

    fn max_batch_size(&self) -> usize {
        (**self).max_batch_size()
    }
}
