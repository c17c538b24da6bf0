//! Index service boundary.
//!
//! The driver only talks to these traits, so it can run against Redis in
//! production and against fakes/mocks in tests.

use async_trait::async_trait;

use crate::errors::LoadError;
use crate::record::StorageRecord;
use crate::schema::IndexSchema;
use crate::write_pool::{WriteOptions, upsert_bounded};

/// A named, schema-bound index connection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IndexService: Send + Sync {
    /// Whether the index is already defined on the service.
    async fn exists(&self) -> Result<bool, LoadError>;

    /// Creates the index from its schema. With `overwrite`, a stale index
    /// under the same name (and its documents) is dropped first.
    async fn create(&self, overwrite: bool) -> Result<(), LoadError>;

    /// Inserts or replaces one record, addressed by its `key_field` value.
    async fn upsert(&self, record: &StorageRecord, key_field: &str) -> Result<(), LoadError>;

    /// Writes every record with at most `opts.concurrency` upserts in flight.
    ///
    /// Returns the number of records written. Any failure surfaces as a single
    /// [`LoadError::Write`] once all in-flight writes have settled.
    async fn bulk_write(
        &self,
        records: Vec<StorageRecord>,
        key_field: &str,
        opts: WriteOptions,
    ) -> Result<usize, LoadError> {
        upsert_bounded(self, records, key_field, opts).await
    }
}

/// Opens [`IndexService`] handles.
#[async_trait]
pub trait IndexConnector: Send + Sync {
    type Index: IndexService;

    /// Connects to `endpoint` and binds the handle to `schema`.
    ///
    /// # Errors
    /// [`LoadError::Connection`] if the service is unreachable.
    async fn connect(&self, endpoint: &str, schema: &IndexSchema)
    -> Result<Self::Index, LoadError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::KEY_FIELD;
    use crate::testing::{FakeIndex, record};
    use std::num::NonZeroUsize;
    use std::time::Duration;

    fn opts(k: usize) -> WriteOptions {
        WriteOptions::new(NonZeroUsize::new(k).unwrap())
    }

    #[tokio::test]
    async fn bulk_write_default_fans_out_over_upsert() {
        let index = FakeIndex::default().with_delay(Duration::from_millis(2));
        let records: Vec<_> = (0..9).map(|i| record(&format!("b{i}"), 3, 2)).collect();

        let n = index.bulk_write(records, KEY_FIELD, opts(2)).await.unwrap();

        assert_eq!(n, 9);
        assert_eq!(index.upserts(), 9);
        assert_eq!(index.max_in_flight(), 2);
        assert_eq!(index.written_keys().len(), 9);
    }

    #[tokio::test]
    async fn bulk_write_through_trait_object() {
        let fake = FakeIndex::default().failing_on(["b1"]);
        let index: &dyn IndexService = &fake;
        let records: Vec<_> = (0..3).map(|i| record(&format!("b{i}"), 1, 1)).collect();

        let err = index.bulk_write(records, KEY_FIELD, opts(3)).await.unwrap_err();

        assert!(
            matches!(err, LoadError::Write { failed: 1, total: 3, ref first_key, .. } if first_key == "b1"),
            "{err}"
        );
        assert_eq!(fake.upserts(), 3);
    }
}
