//! The `report` command: read-only distribution of the catalog.

use sqlx::PgPool;

use relabel_core::{summarize, Category, Distribution, RecordFilter};
use relabel_db::{PgRecordStore, RecordStore};

/// Print the category/subcategory distribution, optionally scoped to one
/// category.
///
/// # Errors
///
/// Returns an error if the records cannot be fetched.
pub async fn run(pool: &PgPool, category: Option<Category>) -> anyhow::Result<()> {
    let store = PgRecordStore::new(pool.clone());
    let records = store
        .list_records(&RecordFilter {
            category,
            ..RecordFilter::default()
        })
        .await?;
    print_distribution(&summarize(&records));
    Ok(())
}

pub fn print_distribution(distribution: &Distribution) {
    println!("total records: {}", distribution.total);
    for (category, count) in &distribution.by_category {
        println!("  {category:<26} {count:>6}");
    }
    if !distribution.clothing_by_subcategory.is_empty() {
        println!("clothing subcategories:");
        for (sub, count) in &distribution.clothing_by_subcategory {
            println!("  {sub:<26} {count:>6}");
        }
    }
    let classifiable = distribution.classified + distribution.unclassified;
    if classifiable > 0 {
        println!(
            "classified: {}/{} ({:.1}%)",
            distribution.classified,
            classifiable,
            distribution.classified_ratio() * 100.0
        );
    }
}
