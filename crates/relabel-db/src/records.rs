//! Database operations for the `products` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use relabel_core::{Category, ProductRecord, RecordFilter, RecordPatch};

use crate::DbError;

/// A row from the `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub title: String,
    /// Stored as text; legacy rows may carry values outside the current
    /// category set and are mapped to `Other` on conversion.
    pub category: String,
    pub sub_category: Option<String>,
    pub brand: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductRow {
    /// Convert to the domain record the classifier operates on.
    #[must_use]
    pub fn into_record(self) -> ProductRecord {
        ProductRecord {
            id: self.id,
            title: self.title,
            category: Category::parse_lossy(&self.category),
            sub_category: self.sub_category,
            brand: self.brand,
        }
    }
}

/// List records matching the filter, ordered by `id` for stable batching.
///
/// Each filter field is optional; unset fields do not constrain the query.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_records(pool: &PgPool, filter: &RecordFilter) -> Result<Vec<ProductRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(
        "SELECT id, title, category, sub_category, brand, created_at, updated_at \
         FROM products \
         WHERE ($1::text IS NULL OR category = $1) \
           AND (NOT $2 OR sub_category IS NULL) \
           AND ($3::text IS NULL OR brand = $3) \
         ORDER BY id",
    )
    .bind(filter.category.map(|c| c.as_str().to_string()))
    .bind(filter.sub_category_is_null)
    .bind(filter.brand.as_deref())
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Apply a patch to every id in the set with a single statement.
///
/// `None` patch fields leave the column untouched. Accepts at least 100 ids
/// per call; callers chunk larger sets.
///
/// Returns the number of rows updated.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn update_many(pool: &PgPool, ids: &[i64], patch: &RecordPatch) -> Result<u64, DbError> {
    if ids.is_empty() || patch.is_empty() {
        return Ok(0);
    }

    let rows_affected = sqlx::query(
        "UPDATE products SET \
             category     = COALESCE($2, category), \
             sub_category = COALESCE($3, sub_category), \
             brand        = COALESCE($4, brand), \
             updated_at   = NOW() \
         WHERE id = ANY($1)",
    )
    .bind(ids)
    .bind(patch.category.as_deref())
    .bind(patch.sub_category.as_deref())
    .bind(patch.brand.as_deref())
    .execute(pool)
    .await?
    .rows_affected();

    Ok(rows_affected)
}

/// Apply a patch to a single record (admin edit path) and return the
/// updated row.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the id does not exist, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_one(pool: &PgPool, id: i64, patch: &RecordPatch) -> Result<ProductRow, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(
        "UPDATE products SET \
             category     = COALESCE($2, category), \
             sub_category = COALESCE($3, sub_category), \
             brand        = COALESCE($4, brand), \
             updated_at   = NOW() \
         WHERE id = $1 \
         RETURNING id, title, category, sub_category, brand, created_at, updated_at",
    )
    .bind(id)
    .bind(patch.category.as_deref())
    .bind(patch.sub_category.as_deref())
    .bind(patch.brand.as_deref())
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}
