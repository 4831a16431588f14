use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::model::{CatalogRecord, DuplicateGroup, GroupKey, MalformedRecord, Partition};

/// Split one category's records into duplicate groups and malformed records.
///
/// Groups come back in key order. Survivor choice does not depend on the
/// order of `records`. An id listed more than once is kept once, as its
/// earliest-created entry, so a survivor never reappears as a duplicate.
pub fn partition(records: &[CatalogRecord], default_tenant: &str) -> Partition {
    let mut unique: Vec<&CatalogRecord> = records.iter().collect();
    unique.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| survivor_order(a, b)));
    unique.dedup_by(|a, b| a.id == b.id);
    let repeated = records.len() - unique.len();

    let mut buckets: BTreeMap<GroupKey, Vec<&CatalogRecord>> = BTreeMap::new();
    let mut malformed = Vec::new();

    for record in unique {
        let tenant = record.tenant_or(default_tenant);
        let Some(value) = record.usable_value() else {
            malformed.push(MalformedRecord {
                id: record.id.clone(),
                tenant: tenant.to_string(),
                reason: if record.value.is_some() { "empty value" } else { "missing value" },
            });
            continue;
        };
        let key = GroupKey {
            tenant: tenant.to_string(),
            value: value.to_string(),
        };
        buckets.entry(key).or_default().push(record);
    }

    let groups = buckets
        .into_iter()
        .map(|(key, mut members)| {
            members.sort_by(|a, b| survivor_order(a, b));
            let survivor = members[0].id.clone();
            let duplicates = members[1..].iter().map(|r| r.id.clone()).collect();
            DuplicateGroup {
                key,
                survivor,
                duplicates,
            }
        })
        .collect();

    malformed.sort_by(|a, b| a.id.cmp(&b.id));

    Partition {
        groups,
        malformed,
        repeated,
    }
}

/// Earliest creation time first; untimestamped records after timestamped
/// ones; ties by smallest id.
fn survivor_order(a: &CatalogRecord, b: &CatalogRecord) -> Ordering {
    match (a.created_at, b.created_at) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.id.cmp(&b.id))
}
