//! In-memory [`DocumentStore`] with deterministic failure injection.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};

use crate::error::StoreError;
use crate::model::{CatalogRecord, CatalogType, RecordId};
use crate::store::{DeleteOutcome, DocumentStore};

#[derive(Debug, Default)]
struct State {
    /// Insertion order is the store's iteration order.
    records: Vec<CatalogRecord>,
    unavailable_types: HashSet<CatalogType>,
    /// Any batch containing one of these ids fails as a whole.
    poisoned_ids: HashSet<RecordId>,
    /// These ids survive a batch that otherwise commits.
    sticky_ids: HashSet<RecordId>,
    batches: Vec<Vec<RecordId>>,
}

pub struct MemoryStore {
    state: RefCell<State>,
    max_batch_size: usize,
}

impl MemoryStore {
    pub fn new(records: Vec<CatalogRecord>) -> Self {
        Self::with_batch_size(records, crate::config::MAX_BATCH_SIZE)
    }

    pub fn with_batch_size(records: Vec<CatalogRecord>, max_batch_size: usize) -> Self {
        Self {
            state: RefCell::new(State {
                records,
                ..State::default()
            }),
            max_batch_size,
        }
    }

    pub fn insert(&self, record: CatalogRecord) {
        self.state.borrow_mut().records.push(record);
    }

    /// Make `list_records` fail for `catalog_type`.
    pub fn fail_listing(&self, catalog_type: CatalogType) {
        self.state.borrow_mut().unavailable_types.insert(catalog_type);
    }

    /// Make every batch containing `id` fail atomically.
    pub fn fail_batches_containing(&self, id: impl Into<RecordId>) {
        self.state.borrow_mut().poisoned_ids.insert(id.into());
    }

    /// Let batches containing `id` commit, except for `id` itself.
    pub fn keep_on_delete(&self, id: impl Into<RecordId>) {
        self.state.borrow_mut().sticky_ids.insert(id.into());
    }

    pub fn records(&self) -> Vec<CatalogRecord> {
        self.state.borrow().records.clone()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: &str) -> bool {
        self.state.borrow().records.iter().any(|r| r.id.as_str() == id)
    }

    /// Every batch passed to `delete_batch`, committed or not.
    pub fn batches(&self) -> Vec<Vec<RecordId>> {
        self.state.borrow().batches.clone()
    }

    /// Count of live records per (type, tenant, value).
    pub fn key_counts(&self, default_tenant: &str) -> BTreeMap<(CatalogType, String, String), usize> {
        let mut counts = BTreeMap::new();
        for r in &self.state.borrow().records {
            if let Some(value) = r.usable_value() {
                let key = (r.catalog_type, r.tenant_or(default_tenant).to_string(), value.to_string());
                *counts.entry(key).or_insert(0) += 1;
            }
        }
        counts
    }
}

impl DocumentStore for MemoryStore {
    fn list_records(&self, catalog_type: CatalogType) -> Result<Vec<CatalogRecord>, StoreError> {
        let state = self.state.borrow();
        if state.unavailable_types.contains(&catalog_type) {
            return Err(StoreError::Unavailable(format!(
                "listing {catalog_type} refused by test store"
            )));
        }
        Ok(state
            .records
            .iter()
            .filter(|r| r.catalog_type == catalog_type)
            .cloned()
            .collect())
    }

    fn delete_batch(&self, ids: &[RecordId]) -> Result<DeleteOutcome, StoreError> {
        let mut state = self.state.borrow_mut();
        state.batches.push(ids.to_vec());

        if ids.len() > self.max_batch_size {
            return Err(StoreError::Rejected {
                status: 400,
                message: format!("batch of {} exceeds limit {}", ids.len(), self.max_batch_size),
            });
        }
        if ids.iter().any(|id| state.poisoned_ids.contains(id)) {
            return Err(StoreError::Rejected {
                status: 403,
                message: "permission denied".into(),
            });
        }

        let not_deleted: Vec<RecordId> = ids
            .iter()
            .filter(|id| state.sticky_ids.contains(*id))
            .cloned()
            .collect();
        let doomed: HashSet<&RecordId> =
            ids.iter().filter(|id| !state.sticky_ids.contains(*id)).collect();
        let remaining: Vec<CatalogRecord> = state
            .records
            .iter()
            .filter(|r| !doomed.contains(&r.id))
            .cloned()
            .collect();
        state.records = remaining;

        if not_deleted.is_empty() {
            Ok(DeleteOutcome::Committed)
        } else {
            Ok(DeleteOutcome::Partial { not_deleted })
        }
    }

    fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }
}
