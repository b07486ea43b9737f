//! The batch reclassification driver: classify a working set, group ids by
//! outcome, and apply grouped, chunked updates with bounded concurrency.
//!
//! A failed chunk never aborts the run or corrupts the counts of other
//! chunks; its ids are reported as failed and the remaining chunks proceed.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::stream::{self, StreamExt};

use relabel_core::{
    BrandCorrections, ClassifyError, Hints, RecordFilter, RecordPatch, RuleTable, DEFAULT_BRAND,
};
use relabel_db::{DbError, RecordStore};

#[derive(Debug, Clone, Copy)]
pub(crate) struct DriverOptions {
    /// Ids per `update_many` statement.
    pub chunk_size: usize,
    /// Update calls in flight at once.
    pub max_concurrent_batches: usize,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    /// Classify and report without writing.
    pub dry_run: bool,
}

impl DriverOptions {
    pub(crate) fn from_app_config(config: &relabel_core::AppConfig, dry_run: bool) -> Self {
        Self {
            chunk_size: config.batch_chunk_size,
            max_concurrent_batches: config.max_concurrent_batches,
            max_retries: config.update_max_retries,
            backoff_base_ms: config.retry_backoff_base_ms,
            dry_run,
        }
    }
}

/// A distinct update target: the patch every id in the group receives.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Outcome {
    sub_category: Option<String>,
    brand: Option<String>,
}

impl Outcome {
    fn patch(&self) -> RecordPatch {
        RecordPatch {
            category: None,
            sub_category: self.sub_category.clone(),
            brand: self.brand.clone(),
        }
    }

    fn label(&self) -> String {
        let mut parts = Vec::new();
        if let Some(sub) = &self.sub_category {
            parts.push(format!("sub_category={sub}"));
        }
        if let Some(brand) = &self.brand {
            parts.push(format!("brand={brand}"));
        }
        parts.join(" ")
    }
}

/// A chunk whose update failed after retries.
#[derive(Debug)]
pub(crate) struct FailedBatch {
    pub outcome: String,
    pub ids: Vec<i64>,
    pub error: String,
}

#[derive(Debug, Default)]
pub(crate) struct ReclassifyReport {
    pub scanned: usize,
    /// Records with an empty title, skipped rather than classified.
    pub skipped: usize,
    /// Records already carrying the values the classifier produced.
    pub unchanged: usize,
    /// Records no rule matched; their existing values were left untouched.
    pub unclassified: usize,
    /// Rows updated per outcome label (ids grouped per outcome in dry runs).
    pub updated: BTreeMap<String, usize>,
    pub failed: Vec<FailedBatch>,
    /// Ids whose chunks were never issued because the run was cancelled.
    pub cancelled_ids: usize,
    pub dry_run: bool,
}

impl ReclassifyReport {
    pub(crate) fn updated_total(&self) -> usize {
        self.updated.values().sum()
    }

    pub(crate) fn any_failed(&self) -> bool {
        !self.failed.is_empty()
    }
}

enum ChunkResult {
    Updated(u64),
    Failed(String),
    Cancelled,
}

/// Run the classifier over every record the filter selects and apply the
/// results as grouped, chunked updates.
///
/// Updates only ever move a record toward "classified": the driver never
/// nulls out an existing subcategory, and reruns converge to zero updates.
/// Setting `cancel` stops new chunks from being issued; in-flight chunks
/// complete and a partial report is returned.
///
/// # Errors
///
/// Returns [`DbError`] only if the initial fetch fails; update failures are
/// captured per chunk in the report instead.
pub(crate) async fn run_reclassify<S: RecordStore>(
    store: &S,
    rules: &RuleTable,
    corrections: &BrandCorrections,
    filter: &RecordFilter,
    options: &DriverOptions,
    cancel: &AtomicBool,
) -> Result<ReclassifyReport, DbError> {
    let records = store.list_records(filter).await?;

    let mut report = ReclassifyReport {
        scanned: records.len(),
        dry_run: options.dry_run,
        ..ReclassifyReport::default()
    };

    let mut groups: BTreeMap<Outcome, Vec<i64>> = BTreeMap::new();

    for record in &records {
        let hints = Hints {
            existing_brand: record.brand.as_deref(),
        };
        let classification = match rules.classify(&record.title, record.category, hints) {
            Ok(c) => c,
            Err(ClassifyError::EmptyTitle) => {
                tracing::warn!(id = record.id, "skipping record with empty title");
                report.skipped += 1;
                continue;
            }
        };

        // Only overwrite when the engine produced a value; an empty result
        // never nulls out what a record already has.
        let sub_category = classification
            .sub_category
            .map(|s| s.as_str().to_string())
            .filter(|s| record.sub_category.as_deref() != Some(s.as_str()));

        // The "Other" fallback is a classification result, not a write: only
        // detected brands and spelling corrections are persisted, which is
        // what keeps reruns convergent.
        let desired_brand = match classification.brand_override.filter(|b| *b != DEFAULT_BRAND) {
            Some(detected) => Some(corrections.correct(detected).to_string()),
            None => record
                .brand
                .as_deref()
                .map(|b| corrections.correct(b).to_string()),
        };
        let brand = desired_brand.filter(|b| record.brand.as_deref() != Some(b.as_str()));

        if sub_category.is_none() && brand.is_none() {
            if classification.sub_category.is_none() {
                report.unclassified += 1;
            } else {
                report.unchanged += 1;
            }
            continue;
        }

        groups
            .entry(Outcome { sub_category, brand })
            .or_default()
            .push(record.id);
    }

    if options.dry_run {
        for (outcome, ids) in &groups {
            report.updated.insert(outcome.label(), ids.len());
        }
        return Ok(report);
    }

    // One update statement per (outcome, chunk); chunks target disjoint id
    // sets, so they can run concurrently in any order.
    let chunks: Vec<(&Outcome, &[i64])> = groups
        .iter()
        .flat_map(|(outcome, ids)| ids.chunks(options.chunk_size).map(move |c| (outcome, c)))
        .collect();

    let results: Vec<(&Outcome, &[i64], ChunkResult)> = stream::iter(&chunks)
        .map(|&(outcome, ids)| async move {
            if cancel.load(Ordering::Relaxed) {
                return (outcome, ids, ChunkResult::Cancelled);
            }
            let patch = outcome.patch();
            match update_with_retry(store, ids, &patch, options).await {
                Ok(rows) => (outcome, ids, ChunkResult::Updated(rows)),
                Err(err) => {
                    tracing::error!(
                        target_outcome = %outcome.label(),
                        ids = ids.len(),
                        error = %err,
                        "batch update failed"
                    );
                    (outcome, ids, ChunkResult::Failed(err.to_string()))
                }
            }
        })
        .buffer_unordered(options.max_concurrent_batches.max(1))
        .collect()
        .await;

    for (outcome, ids, result) in results {
        match result {
            ChunkResult::Updated(rows) => {
                *report.updated.entry(outcome.label()).or_insert(0) +=
                    usize::try_from(rows).unwrap_or(0);
            }
            ChunkResult::Failed(error) => report.failed.push(FailedBatch {
                outcome: outcome.label(),
                ids: ids.to_vec(),
                error,
            }),
            ChunkResult::Cancelled => report.cancelled_ids += ids.len(),
        }
    }

    Ok(report)
}

/// Runs `update_many` with up to `max_retries` additional attempts on
/// transient errors. Back-off doubles per attempt from `backoff_base_ms`,
/// capped at 30 s, with ±25% jitter.
async fn update_with_retry<S: RecordStore>(
    store: &S,
    ids: &[i64],
    patch: &RecordPatch,
    options: &DriverOptions,
) -> Result<u64, DbError> {
    const MAX_DELAY_MS: u64 = 30_000;
    let mut attempt = 0u32;
    loop {
        match store.update_many(ids, patch).await {
            Ok(rows) => return Ok(rows),
            Err(err) => {
                if !err.is_retriable() || attempt >= options.max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = options
                    .backoff_base_ms
                    .saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries = options.max_retries,
                    delay_ms,
                    error = %err,
                    "batch update hit transient error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

#[cfg(test)]
#[path = "driver_test.rs"]
mod tests;
