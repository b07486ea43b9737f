//! The `reclassify` command: apply the canonical rule table across a
//! selected slice of the catalog.

mod driver;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Args;
use sqlx::PgPool;

use relabel_core::{AppConfig, BrandCorrections, Category, RecordFilter, RuleTable};
use relabel_db::{PgRecordStore, RecordStore};

use crate::report::print_distribution;
use driver::{DriverOptions, ReclassifyReport};

#[derive(Debug, Args)]
pub struct ReclassifyArgs {
    /// Category whose records to reclassify
    #[arg(long)]
    pub category: Category,

    /// Only consider records that have never been classified
    #[arg(long)]
    pub only_unclassified: bool,

    /// Restrict to records currently carrying this brand
    #[arg(long)]
    pub brand: Option<String>,

    /// Classify and report without writing to the database
    #[arg(long)]
    pub dry_run: bool,
}

/// Run a reclassification pass. Returns `true` if any batch failed, so the
/// caller can set the exit code.
///
/// # Errors
///
/// Returns an error if the rule table or corrections fail validation, or if
/// the working set cannot be fetched. Per-batch update failures are reported,
/// not propagated.
pub async fn run(pool: &PgPool, config: &AppConfig, args: &ReclassifyArgs) -> anyhow::Result<bool> {
    let rules = RuleTable::canonical()?;
    let corrections = BrandCorrections::from_app_config(config)?;

    let store = PgRecordStore::new(pool.clone());
    let filter = RecordFilter {
        category: Some(args.category),
        sub_category_is_null: args.only_unclassified,
        brand: args.brand.clone(),
    };
    let options = DriverOptions::from_app_config(config, args.dry_run);

    // Ctrl-C stops new batches from being issued; in-flight batches finish
    // and a partial report is printed.
    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_flag = Arc::clone(&cancel);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("cancellation requested, finishing in-flight batches");
            cancel_flag.store(true, Ordering::Relaxed);
        }
    });

    let report =
        driver::run_reclassify(&store, &rules, &corrections, &filter, &options, &cancel).await?;
    print_report(&report);

    if !args.dry_run {
        let after = store
            .list_records(&RecordFilter {
                category: Some(args.category),
                ..RecordFilter::default()
            })
            .await?;
        println!();
        println!("distribution after run:");
        print_distribution(&relabel_core::summarize(&after));
    }

    Ok(report.any_failed())
}

fn print_report(report: &ReclassifyReport) {
    if report.dry_run {
        println!("dry-run: no updates were written");
    }
    for (outcome, count) in &report.updated {
        println!("updated {count:>6}  {outcome}");
    }
    for failed in &report.failed {
        println!(
            "FAILED  {} ({} ids): {}",
            failed.outcome,
            failed.ids.len(),
            failed.error
        );
    }
    if report.cancelled_ids > 0 {
        println!("cancelled before update: {} ids", report.cancelled_ids);
    }
    println!(
        "scanned {} | updated {} | unchanged {} | unclassified {} | skipped {} | failed batches {}",
        report.scanned,
        report.updated_total(),
        report.unchanged,
        report.unclassified,
        report.skipped,
        report.failed.len()
    );
}
