//! The record-store boundary the batch driver works against.
//!
//! The driver takes an explicit store handle instead of reaching for a
//! module-level client, so tests can substitute an in-memory store and the
//! classifier pipeline never knows which backend it is talking to.

use sqlx::PgPool;

use relabel_core::{ProductRecord, RecordFilter, RecordPatch};

use crate::{records, DbError};

/// Read/write contract the batch reclassification driver needs.
#[allow(async_fn_in_trait)]
pub trait RecordStore {
    /// Fetch the working set for a batch run.
    async fn list_records(&self, filter: &RecordFilter) -> Result<Vec<ProductRecord>, DbError>;

    /// Apply one patch to a set of ids; returns rows updated. Must accept at
    /// least 100 ids per call.
    async fn update_many(&self, ids: &[i64], patch: &RecordPatch) -> Result<u64, DbError>;
}

/// Postgres-backed store over a shared connection pool.
#[derive(Debug, Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl RecordStore for PgRecordStore {
    async fn list_records(&self, filter: &RecordFilter) -> Result<Vec<ProductRecord>, DbError> {
        let rows = records::list_records(&self.pool, filter).await?;
        Ok(rows.into_iter().map(records::ProductRow::into_record).collect())
    }

    async fn update_many(&self, ids: &[i64], patch: &RecordPatch) -> Result<u64, DbError> {
        records::update_many(&self.pool, ids, patch).await
    }
}
