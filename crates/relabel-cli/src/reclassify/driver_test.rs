use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use relabel_core::{Category, ProductRecord};

use super::*;

/// In-memory record store with optional injected update failures.
struct MemStore {
    records: Mutex<Vec<ProductRecord>>,
    /// Updates whose patch sets this subcategory fail while
    /// `failures_remaining` is positive.
    fail_subcategory: Option<String>,
    failures_remaining: AtomicUsize,
    update_calls: AtomicUsize,
}

impl MemStore {
    fn new(records: Vec<ProductRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            fail_subcategory: None,
            failures_remaining: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
        }
    }

    fn failing_on(mut self, sub_category: &str, failures: usize) -> Self {
        self.fail_subcategory = Some(sub_category.to_string());
        self.failures_remaining = AtomicUsize::new(failures);
        self
    }

    fn snapshot(&self) -> Vec<ProductRecord> {
        self.records.lock().unwrap().clone()
    }

    fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::Relaxed)
    }
}

impl RecordStore for MemStore {
    async fn list_records(&self, filter: &RecordFilter) -> Result<Vec<ProductRecord>, DbError> {
        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .filter(|r| filter.category.is_none_or(|c| r.category == c))
            .filter(|r| !filter.sub_category_is_null || r.sub_category.is_none())
            .filter(|r| {
                filter
                    .brand
                    .as_deref()
                    .is_none_or(|b| r.brand.as_deref() == Some(b))
            })
            .cloned()
            .collect())
    }

    async fn update_many(&self, ids: &[i64], patch: &RecordPatch) -> Result<u64, DbError> {
        self.update_calls.fetch_add(1, Ordering::Relaxed);

        if let Some(fail_sub) = &self.fail_subcategory {
            if patch.sub_category.as_deref() == Some(fail_sub.as_str())
                && self
                    .failures_remaining
                    .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
                    .is_ok()
            {
                return Err(DbError::Unavailable("injected failure".to_string()));
            }
        }

        let mut records = self.records.lock().unwrap();
        let mut updated = 0u64;
        for record in records.iter_mut().filter(|r| ids.contains(&r.id)) {
            if let Some(sub) = &patch.sub_category {
                record.sub_category = Some(sub.clone());
            }
            if let Some(brand) = &patch.brand {
                record.brand = Some(brand.clone());
            }
            updated += 1;
        }
        Ok(updated)
    }
}

fn clothing(id: i64, title: &str) -> ProductRecord {
    ProductRecord {
        id,
        title: title.to_string(),
        category: Category::Clothing,
        sub_category: None,
        brand: None,
    }
}

fn clothing_filter() -> RecordFilter {
    RecordFilter {
        category: Some(Category::Clothing),
        ..RecordFilter::default()
    }
}

fn options() -> DriverOptions {
    DriverOptions {
        chunk_size: 100,
        max_concurrent_batches: 2,
        max_retries: 0,
        backoff_base_ms: 1,
        dry_run: false,
    }
}

fn rules() -> RuleTable {
    RuleTable::canonical().unwrap()
}

async fn run(store: &MemStore, opts: &DriverOptions) -> ReclassifyReport {
    let cancel = AtomicBool::new(false);
    run_reclassify(
        store,
        &rules(),
        &BrandCorrections::builtin(),
        &clothing_filter(),
        opts,
        &cancel,
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn end_to_end_scenario() {
    let store = MemStore::new(vec![
        clothing(1, "Nike Tech Fleece Pullover"),
        clothing(2, "Levi's 501 Jeans"),
        clothing(3, "Mystery Box"),
    ]);

    let report = run(&store, &options()).await;

    assert_eq!(report.scanned, 3);
    assert_eq!(report.updated_total(), 2);
    assert_eq!(report.unclassified, 1);
    assert_eq!(report.skipped, 0);
    assert!(!report.any_failed());

    let records = store.snapshot();
    assert_eq!(records[0].sub_category.as_deref(), Some("Tracksuits"));
    assert_eq!(records[0].brand.as_deref(), Some("NIKE"));
    assert_eq!(records[1].sub_category.as_deref(), Some("Pants & Jeans"));
    assert_eq!(records[1].brand.as_deref(), Some("LEVI'S"));
    assert_eq!(records[2].sub_category, None);
    assert_eq!(records[2].brand, None);
}

#[tokio::test]
async fn second_run_produces_zero_updates() {
    let store = MemStore::new(vec![
        clothing(1, "Nike Tech Fleece Pullover"),
        clothing(2, "Levi's 501 Jeans"),
        clothing(3, "Mystery Box"),
    ]);

    let first = run(&store, &options()).await;
    assert_eq!(first.updated_total(), 2);
    let calls_after_first = store.update_calls();

    let second = run(&store, &options()).await;
    assert_eq!(second.updated_total(), 0);
    assert_eq!(second.unchanged, 2);
    assert_eq!(second.unclassified, 1);
    // Convergence: nothing left to group, so no update calls at all.
    assert_eq!(store.update_calls(), calls_after_first);
}

#[tokio::test]
async fn dry_run_writes_nothing() {
    let store = MemStore::new(vec![
        clothing(1, "Carhartt Denim Jacket"),
        clothing(2, "Mystery Box"),
    ]);
    let opts = DriverOptions {
        dry_run: true,
        ..options()
    };

    let report = run(&store, &opts).await;

    assert!(report.dry_run);
    assert_eq!(report.updated_total(), 1);
    assert_eq!(store.update_calls(), 0);
    assert!(store.snapshot().iter().all(|r| r.sub_category.is_none()));
}

#[tokio::test]
async fn unmatched_title_never_nulls_existing_subcategory() {
    let mut record = clothing(1, "Mystery Box");
    record.sub_category = Some("Vintage".to_string());
    record.brand = Some("Other".to_string());
    let store = MemStore::new(vec![record]);

    let report = run(&store, &options()).await;

    assert_eq!(report.unclassified, 1);
    assert_eq!(report.updated_total(), 0);
    let records = store.snapshot();
    assert_eq!(records[0].sub_category.as_deref(), Some("Vintage"));
}

#[tokio::test]
async fn empty_title_is_skipped_not_fatal() {
    let store = MemStore::new(vec![clothing(1, "   "), clothing(2, "Wool Sweater")]);

    let report = run(&store, &options()).await;

    assert_eq!(report.skipped, 1);
    assert_eq!(report.updated_total(), 1);
    let records = store.snapshot();
    assert_eq!(records[1].sub_category.as_deref(), Some("Sweaters"));
}

#[tokio::test]
async fn failed_batch_is_isolated_from_other_batches() {
    let store = MemStore::new(vec![
        clothing(1, "Plain Hoodie"),
        clothing(2, "Leather Jacket"),
    ])
    .failing_on("Hoodies", usize::MAX);

    let report = run(&store, &options()).await;

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].ids, vec![1]);
    assert!(report.failed[0].outcome.contains("Hoodies"));
    // The other outcome still committed and was counted.
    assert_eq!(report.updated_total(), 1);
    let records = store.snapshot();
    assert_eq!(records[0].sub_category, None);
    assert_eq!(records[1].sub_category.as_deref(), Some("Jackets"));
}

#[tokio::test]
async fn transient_failure_is_retried_once() {
    let store = MemStore::new(vec![clothing(1, "Plain Hoodie")]).failing_on("Hoodies", 1);
    let opts = DriverOptions {
        max_retries: 1,
        ..options()
    };

    let report = run(&store, &opts).await;

    assert!(!report.any_failed());
    assert_eq!(report.updated_total(), 1);
    // First attempt failed, retry succeeded.
    assert_eq!(store.update_calls(), 2);
    assert_eq!(store.snapshot()[0].sub_category.as_deref(), Some("Hoodies"));
}

#[tokio::test]
async fn cancellation_skips_pending_chunks() {
    let store = MemStore::new(vec![
        clothing(1, "Plain Hoodie"),
        clothing(2, "Leather Jacket"),
    ]);
    let cancel = AtomicBool::new(true);

    let report = run_reclassify(
        &store,
        &rules(),
        &BrandCorrections::builtin(),
        &clothing_filter(),
        &options(),
        &cancel,
    )
    .await
    .unwrap();

    assert_eq!(report.updated_total(), 0);
    assert_eq!(report.cancelled_ids, 2);
    assert_eq!(store.update_calls(), 0);
    assert!(store.snapshot().iter().all(|r| r.sub_category.is_none()));
}

#[tokio::test]
async fn existing_misspelled_brand_is_corrected() {
    let mut record = clothing(1, "Mystery Box");
    record.brand = Some("ADIDSA".to_string());
    let store = MemStore::new(vec![record]);

    let report = run(&store, &options()).await;

    assert_eq!(report.updated_total(), 1);
    assert!(report.updated.contains_key("brand=ADIDAS"));
    assert_eq!(store.snapshot()[0].brand.as_deref(), Some("ADIDAS"));

    // Correction is idempotent across runs.
    let second = run(&store, &options()).await;
    assert_eq!(second.updated_total(), 0);
}

#[tokio::test]
async fn chunking_splits_large_groups() {
    let records: Vec<ProductRecord> = (1..=250)
        .map(|id| clothing(id, "Plain Hoodie"))
        .collect();
    let store = MemStore::new(records);

    let report = run(&store, &options()).await;

    assert_eq!(report.updated_total(), 250);
    // 250 ids at chunk size 100 → 3 update calls for the single outcome.
    assert_eq!(store.update_calls(), 3);
}
