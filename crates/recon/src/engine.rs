use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::ReconcileConfig;
use crate::error::ReconcileError;
use crate::group::partition;
use crate::model::{CatalogType, RecordId};
use crate::report::{summarize, CategoryReport, CategoryStatus, RunMeta, RunReport};
use crate::store::{DeleteOutcome, DocumentStore};

/// Cancel token for a reconciliation run.
/// Set to true to stop before the next batch; a batch in flight completes.
pub type CancelToken = Arc<AtomicBool>;

fn is_cancelled(cancel: Option<&CancelToken>) -> bool {
    cancel.is_some_and(|c| c.load(Ordering::Relaxed))
}

/// Run reconciliation over every configured category, one at a time.
///
/// Store failures never abort the run: they are recorded on the affected
/// category and the next category is processed.
pub fn run<S: DocumentStore + ?Sized>(
    store: &S,
    config: &ReconcileConfig,
    cancel: Option<&CancelToken>,
) -> RunReport {
    let (types, skipped_types) = config.resolve_types();
    for name in &skipped_types {
        warn!(catalog_type = %name, "unknown catalog type, skipping");
    }

    let batch_size = config.batch_size.min(store.max_batch_size()).max(1);
    let mut categories = Vec::with_capacity(types.len());

    for catalog_type in types {
        if is_cancelled(cancel) {
            warn!(catalog_type = %catalog_type, "run cancelled before category");
            categories.push(CategoryReport::cancelled(catalog_type));
            continue;
        }
        categories.push(reconcile_category(store, catalog_type, config, batch_size, cancel));
    }

    let (totals, status) = summarize(&categories);
    info!(
        status = %status,
        kept = totals.kept,
        deleted = totals.deleted,
        "reconciliation finished"
    );

    RunReport {
        meta: RunMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            dry_run: config.dry_run,
        },
        status,
        totals,
        categories,
        skipped_types,
    }
}

/// Reconcile a single category.
pub fn reconcile_category<S: DocumentStore + ?Sized>(
    store: &S,
    catalog_type: CatalogType,
    config: &ReconcileConfig,
    batch_size: usize,
    cancel: Option<&CancelToken>,
) -> CategoryReport {
    let mut report = CategoryReport::new(catalog_type);

    let records = match store.list_records(catalog_type) {
        Ok(records) => records,
        Err(e) => {
            warn!(catalog_type = %catalog_type, error = %e, "fetch failed, nothing deleted");
            report.status = CategoryStatus::Failed;
            report.errors.push(ReconcileError::StoreUnavailable { reason: e.to_string() });
            return report;
        }
    };

    let split = partition(&records, &config.default_tenant);
    let counts = &mut report.counts;
    counts.seen = records.len() - split.repeated;
    counts.groups = split.groups.len();
    counts.malformed = split.malformed.len();

    info!(
        catalog_type = %catalog_type,
        seen = counts.seen,
        groups = counts.groups,
        duplicates = split.duplicate_count(),
        "category fetched"
    );

    if split.repeated > 0 {
        warn!(catalog_type = %catalog_type, repeated = split.repeated, "listing repeated record ids, counted once");
    }

    for m in &split.malformed {
        warn!(catalog_type = %catalog_type, id = %m.id, tenant = %m.tenant, reason = m.reason, "malformed record left in place");
    }

    let mut cancelled = false;

    'groups: for group in split.groups.iter().filter(|g| g.has_duplicates()) {
        info!(
            catalog_type = %catalog_type,
            tenant = %group.key.tenant,
            value = %group.key.value,
            survivor = %group.survivor,
            duplicates = group.duplicates.len(),
            "duplicate group"
        );

        if config.dry_run {
            continue;
        }

        // A batch never mixes groups, so a failed commit only touches its own group.
        for chunk in group.duplicates.chunks(batch_size) {
            if is_cancelled(cancel) {
                cancelled = true;
                break 'groups;
            }
            match store.delete_batch(chunk) {
                Ok(DeleteOutcome::Committed) => {
                    counts.deleted += chunk.len();
                    counts.batches_committed += 1;
                }
                Ok(DeleteOutcome::Partial { not_deleted }) => {
                    let mut in_chunk: HashSet<&RecordId> = chunk.iter().collect();
                    let left: Vec<RecordId> = not_deleted
                        .into_iter()
                        .filter(|id| in_chunk.remove(id))
                        .collect();
                    warn!(
                        catalog_type = %catalog_type,
                        value = %group.key.value,
                        not_deleted = left.len(),
                        "batch committed partially"
                    );
                    counts.deleted += chunk.len() - left.len();
                    counts.failed_deletes += left.len();
                    counts.batches_committed += 1;
                    if !left.is_empty() {
                        report.errors.push(ReconcileError::PartialDelete { ids: left });
                    }
                }
                Err(e) => {
                    warn!(
                        catalog_type = %catalog_type,
                        value = %group.key.value,
                        ids = chunk.len(),
                        error = %e,
                        "batch commit failed"
                    );
                    counts.failed_deletes += chunk.len();
                    counts.batches_failed += 1;
                    report.errors.push(ReconcileError::BatchCommitFailed {
                        ids: chunk.to_vec(),
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    counts.planned = split.duplicate_count() - counts.deleted - counts.failed_deletes;
    counts.kept = counts.seen - counts.deleted;
    report.malformed = split.malformed;

    report.status = if cancelled {
        CategoryStatus::Cancelled
    } else if counts.failed_deletes > 0 {
        CategoryStatus::PartialFailure
    } else {
        CategoryStatus::Ok
    };

    info!(
        catalog_type = %catalog_type,
        status = %report.status,
        kept = counts.kept,
        deleted = counts.deleted,
        "category done"
    );

    report
}
