//! End-to-end load: validate config → connect → exists? → create → read → map → bulk upsert.
//!
//! The existence check is the only idempotence guard: an index that exists at
//! all is treated as fully loaded.

use std::path::Path;

use crate::config::LoaderConfig;
use crate::errors::LoadError;
use crate::index::{IndexConnector, IndexService};
use crate::io_json::read_catalog;
use crate::mappers::map_catalog;
use crate::record::{KEY_FIELD, LoadOutcome};
use crate::schema::IndexSchema;
use crate::write_pool::WriteOptions;

use tracing::{debug, info};

/// Loads the catalog described by `cfg` through `connector`.
///
/// Configuration is validated (and the schema read) before the index service
/// is contacted.
pub async fn load_catalog<C>(connector: &C, cfg: &LoaderConfig) -> Result<LoadOutcome, LoadError>
where
    C: IndexConnector + ?Sized,
{
    cfg.validate()?;
    let opts = WriteOptions {
        concurrency: cfg.concurrency()?,
        show_progress: cfg.show_progress,
    };
    let schema = IndexSchema::from_yaml_file(&cfg.schema_path)?;

    load_with_schema(connector, &cfg.redis_url, &schema, cfg.catalog_path(), opts).await
}

/// Same as [`load_catalog`] with an already-parsed schema and explicit catalog path.
pub async fn load_with_schema<C>(
    connector: &C,
    endpoint: &str,
    schema: &IndexSchema,
    catalog_path: impl AsRef<Path>,
    opts: WriteOptions,
) -> Result<LoadOutcome, LoadError>
where
    C: IndexConnector + ?Sized,
{
    let name = schema.name().to_string();
    let index = connector.connect(endpoint, schema).await?;

    if index.exists().await? {
        info!("Index '{}' already exists, skipping product load", name);
        return Ok(LoadOutcome::Skipped { index: name });
    }

    index.create(true).await?;

    info!("Loading products from {:?}", catalog_path.as_ref());
    let raws = read_catalog(catalog_path)?;
    let records = map_catalog(&raws, schema.vector_dims())?;
    drop(raws);
    debug!("Prepared {} storage records", records.len());

    info!("Loading {} products into index '{}'", records.len(), name);
    let written = index.bulk_write(records, KEY_FIELD, opts).await?;

    info!("Products successfully loaded: {}", written);
    Ok(LoadOutcome::Loaded {
        index: name,
        records: written,
    })
}
