//! Product catalog loader for a RediSearch vector index.
//!
//! This crate provides a small API to:
//! - Read the `product_vectors.json` catalog (image + text embeddings and tags)
//! - Re-encode vectors as `f32` blobs ready for hash storage
//! - Create the index once and upsert every product with bounded concurrency
//!
//! The index service sits behind [`IndexConnector`] / [`IndexService`] so the
//! pipeline runs against Redis in production and against fakes in tests.

mod blob;
mod config;
mod errors;
mod index;
mod ingest;
mod io_json;
mod mappers;
mod record;
mod redis_index;
mod schema;
mod write_pool;

#[cfg(test)]
mod testing;

pub use blob::{decode_f32_blob, encode_f32_blob};
pub use config::{CATALOG_FILE_NAME, LoaderConfig, load_dotenv};
pub use errors::LoadError;
pub use index::{IndexConnector, IndexService};
pub use ingest::{load_catalog, load_with_schema};
pub use io_json::read_catalog;
pub use mappers::{map_catalog, map_product};
pub use record::{FieldValue, KEY_FIELD, LoadOutcome, RawProduct, StorageRecord, VectorDims};
pub use redis_index::{RedisConnector, RedisIndex};
pub use schema::{DistanceMetric, FieldAttrs, FieldDef, FieldKind, IndexInfo, IndexSchema};
pub use write_pool::{WriteOptions, upsert_bounded};

use tracing::trace;

/// High-level facade over configuration and the Redis connector.
///
/// This is the single entry point recommended for application code.
pub struct CatalogLoader {
    cfg: LoaderConfig,
}

impl CatalogLoader {
    /// Constructs a loader from the given configuration.
    ///
    /// # Errors
    /// Returns `LoadError::Config` if the configuration is invalid.
    pub fn new(cfg: LoaderConfig) -> Result<Self, LoadError> {
        cfg.validate()?;
        trace!("CatalogLoader::new data={:?}", cfg.data_location);
        Ok(Self { cfg })
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.cfg
    }

    /// Loads the catalog into Redis unless the index already exists.
    ///
    /// # Errors
    /// Any [`LoadError`]; nothing is retried.
    pub async fn run(&self) -> Result<LoadOutcome, LoadError> {
        self.run_with(&RedisConnector).await
    }

    /// Same as [`CatalogLoader::run`] against a caller-supplied index service.
    pub async fn run_with<C>(&self, connector: &C) -> Result<LoadOutcome, LoadError>
    where
        C: IndexConnector + ?Sized,
    {
        load_catalog(connector, &self.cfg).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeConnector, FakeIndex, fixture, raw_product};

    #[test]
    fn new_rejects_invalid_config() {
        let mut cfg = LoaderConfig::new_default("redis://localhost:6379", "data");
        cfg.write_concurrency = 0;
        assert!(matches!(CatalogLoader::new(cfg), Err(LoadError::Config(_))));
    }

    #[tokio::test]
    async fn run_with_drives_the_connector() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = serde_json::json!([raw_product("a", 3, 2), raw_product("b", 3, 2)]);
        let cfg = fixture(dir.path(), &catalog, 1);
        let connector = FakeConnector::new(FakeIndex::default());

        let loader = CatalogLoader::new(cfg).unwrap();
        let outcome = loader.run_with(&connector).await.unwrap();

        assert_eq!(
            outcome,
            LoadOutcome::Loaded {
                index: "products".into(),
                records: 2
            }
        );
        assert_eq!(connector.index.max_in_flight(), 1);
    }
}
