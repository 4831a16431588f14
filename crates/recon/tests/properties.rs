// Property-based tests for the reconciliation engine.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::BTreeSet;

use proptest::prelude::*;
use sitebook_recon::memory::MemoryStore;
use sitebook_recon::{run, CatalogRecord, CatalogType, ReconcileConfig};

const DEFAULT_TENANT: &str = "default-company";

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

fn arb_type() -> impl Strategy<Value = CatalogType> {
    prop::sample::select(CatalogType::ALL.to_vec())
}

/// Small pools so duplicates are common.
fn arb_tenant() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        4 => prop::sample::select(vec!["T1", "T2", "T3"]).prop_map(|t| Some(t.to_string())),
        1 => Just(None),
        1 => Just(Some(DEFAULT_TENANT.to_string())),
    ]
}

fn arb_value() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        6 => prop::sample::select(vec!["m2", "kg", "adet", "cash", "active"]).prop_map(|v| Some(v.to_string())),
        1 => Just(Some(String::new())),
        1 => Just(None),
    ]
}

fn arb_records() -> impl Strategy<Value = Vec<CatalogRecord>> {
    prop::collection::vec((arb_type(), arb_tenant(), arb_value()), 0..60).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (t, tenant, value))| CatalogRecord {
                id: format!("doc{i:03}").into(),
                catalog_type: t,
                tenant,
                value,
                created_at: None,
            })
            .collect()
    })
}

fn arb_batch_size() -> impl Strategy<Value = usize> {
    prop_oneof![3 => Just(500usize), 1 => 1..4usize]
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn conservation_holds_per_category(records in arb_records(), batch in arb_batch_size()) {
        let store = MemoryStore::with_batch_size(records, batch);
        let report = run(&store, &ReconcileConfig::default(), None);
        for cat in &report.categories {
            prop_assert!(cat.counts.is_conserved(), "{:?}", cat.counts);
        }
        prop_assert!(report.totals.is_conserved());
        prop_assert_eq!(report.totals.kept, store.len());
    }

    #[test]
    fn every_key_has_exactly_one_record_after_run(records in arb_records(), batch in arb_batch_size()) {
        let before: BTreeSet<_> = MemoryStore::new(records.clone())
            .key_counts(DEFAULT_TENANT)
            .into_keys()
            .collect();

        let store = MemoryStore::with_batch_size(records, batch);
        run(&store, &ReconcileConfig::default(), None);
        let after = store.key_counts(DEFAULT_TENANT);

        prop_assert_eq!(after.keys().cloned().collect::<BTreeSet<_>>(), before);
        prop_assert!(after.values().all(|&n| n == 1));
    }

    #[test]
    fn second_run_is_a_no_op(records in arb_records()) {
        let store = MemoryStore::new(records);
        let config = ReconcileConfig::default();
        run(&store, &config, None);
        let batches = store.batches().len();

        let second = run(&store, &config, None);
        prop_assert_eq!(second.totals.deleted, 0);
        prop_assert_eq!(store.batches().len(), batches);
    }

    #[test]
    fn malformed_records_always_survive(records in arb_records()) {
        let malformed: Vec<String> = records
            .iter()
            .filter(|r| r.usable_value().is_none())
            .map(|r| r.id.to_string())
            .collect();
        let store = MemoryStore::new(records);
        run(&store, &ReconcileConfig::default(), None);
        for id in &malformed {
            prop_assert!(store.contains(id));
        }
    }

    #[test]
    fn survivor_does_not_depend_on_store_order(records in arb_records()) {
        let mut reversed = records.clone();
        reversed.reverse();

        let a = MemoryStore::new(records);
        let b = MemoryStore::new(reversed);
        run(&a, &ReconcileConfig::default(), None);
        run(&b, &ReconcileConfig::default(), None);

        let ids = |s: &MemoryStore| s.records().into_iter().map(|r| r.id).collect::<BTreeSet<_>>();
        prop_assert_eq!(ids(&a), ids(&b));
    }
}
