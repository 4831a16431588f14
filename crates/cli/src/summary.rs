//! Human-readable run report.

use std::io::{self, Write};

use sitebook_recon::{CategoryReport, CategoryStatus, RunReport};

const RULE_WIDTH: usize = 60;

/// Write the per-category and aggregate report.
pub fn write_report(out: &mut impl Write, report: &RunReport) -> io::Result<()> {
    if report.meta.dry_run {
        writeln!(out, "dry run: no records will be deleted")?;
    }

    for cat in &report.categories {
        write_category(out, cat, report.meta.dry_run)?;
    }

    for name in &report.skipped_types {
        writeln!(out, "{name}: skipped (unknown catalog type)")?;
    }

    let t = &report.totals;
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
    writeln!(
        out,
        "total: {} seen, {} groups, {} kept, {} deleted",
        t.seen, t.groups, t.kept, t.deleted,
    )?;
    if t.planned > 0 {
        writeln!(out, "       {} duplicate(s) not deleted (planned)", t.planned)?;
    }
    if t.malformed > 0 {
        writeln!(out, "       {} malformed record(s) need review", t.malformed)?;
    }
    if t.failed_deletes > 0 {
        writeln!(
            out,
            "       {} deletion(s) failed in {} batch(es); re-run to retry",
            t.failed_deletes, t.batches_failed,
        )?;
    }
    writeln!(out, "result: {}", report.status)?;
    Ok(())
}

fn write_category(out: &mut impl Write, cat: &CategoryReport, dry_run: bool) -> io::Result<()> {
    let c = &cat.counts;
    match cat.status {
        CategoryStatus::Failed => {
            writeln!(out, "{}: failed", cat.catalog_type)?;
        }
        CategoryStatus::Cancelled if c.seen == 0 => {
            writeln!(out, "{}: cancelled", cat.catalog_type)?;
            return Ok(());
        }
        _ => {
            let deleted = if dry_run {
                format!("{} to delete", c.planned)
            } else {
                format!("{} deleted", c.deleted)
            };
            writeln!(
                out,
                "{}: {} seen, {} groups, {} kept, {}{}",
                cat.catalog_type,
                c.seen,
                c.groups,
                c.kept,
                deleted,
                match cat.status {
                    CategoryStatus::PartialFailure => " (partial failure)",
                    CategoryStatus::Cancelled => " (cancelled)",
                    _ => "",
                },
            )?;
        }
    }

    for m in &cat.malformed {
        writeln!(out, "  malformed: {} (tenant {}, {})", m.id, m.tenant, m.reason)?;
    }
    for e in &cat.errors {
        writeln!(out, "  error: {e}")?;
    }
    Ok(())
}
