//! Thin adapter around `redis` for a RediSearch hash index.
//!
//! All `FT.*` and `HSET` traffic goes through here; the rest of the crate only
//! sees the [`IndexService`] / [`IndexConnector`] traits.

use crate::errors::LoadError;
use crate::index::{IndexConnector, IndexService};
use crate::record::{FieldValue, StorageRecord};
use crate::schema::{DistanceMetric, FieldKind, IndexSchema, VectorAlgorithm};

use async_trait::async_trait;
use redis::Client;
use redis::aio::ConnectionManager;
use tracing::{debug, info, trace, warn};

/// Connects [`RedisIndex`] handles.
#[derive(Clone, Copy, Debug, Default)]
pub struct RedisConnector;

#[async_trait]
impl IndexConnector for RedisConnector {
    type Index = RedisIndex;

    async fn connect(&self, endpoint: &str, schema: &IndexSchema) -> Result<RedisIndex, LoadError> {
        RedisIndex::connect(endpoint, schema.clone()).await
    }
}

/// A RediSearch index over hashes, bound to one schema.
///
/// The connection manager is cheap to clone; every upsert uses its own clone
/// so writes can be pipelined by the server connection.
#[derive(Clone)]
pub struct RedisIndex {
    manager: ConnectionManager,
    schema: IndexSchema,
}

impl RedisIndex {
    /// Opens a managed connection and verifies it with `PING`.
    pub async fn connect(url: &str, schema: IndexSchema) -> Result<Self, LoadError> {
        info!("Connecting to Redis at {}", url);

        let conn_err = |e: redis::RedisError| LoadError::Connection(format!("{url}: {e}"));
        let client = Client::open(url).map_err(conn_err)?;
        let manager = ConnectionManager::new(client).await.map_err(conn_err)?;

        let mut conn = manager.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(conn_err)?;

        info!("Connected to Redis, index '{}'", schema.name());
        Ok(Self { manager, schema })
    }

    pub fn schema(&self) -> &IndexSchema {
        &self.schema
    }
}

#[async_trait]
impl IndexService for RedisIndex {
    async fn exists(&self) -> Result<bool, LoadError> {
        let name = self.schema.name();
        let mut conn = self.manager.clone();
        match redis::cmd("FT.INFO")
            .arg(name)
            .query_async::<redis::Value>(&mut conn)
            .await
        {
            Ok(_) => {
                debug!("Index '{}' exists", name);
                Ok(true)
            }
            Err(e) if is_unknown_index(&e) => {
                debug!("Index '{}' not found ({})", name, e);
                Ok(false)
            }
            Err(e) => Err(LoadError::Connection(format!("FT.INFO {name}: {e}"))),
        }
    }

    async fn create(&self, overwrite: bool) -> Result<(), LoadError> {
        let name = self.schema.name();
        let mut conn = self.manager.clone();

        if overwrite {
            // Best-effort: a missing index is the normal case here.
            match redis::cmd("FT.DROPINDEX")
                .arg(name)
                .arg("DD")
                .query_async::<()>(&mut conn)
                .await
            {
                Ok(()) => warn!("Dropped stale index '{}' and its documents", name),
                Err(e) => trace!("FT.DROPINDEX {}: {}", name, e),
            }
        }

        let args = ft_create_args(&self.schema);
        debug!("FT.CREATE {}", args.join(" "));
        redis::cmd("FT.CREATE")
            .arg(&args)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| LoadError::Connection(format!("FT.CREATE {name}: {e}")))?;

        info!("Index '{}' created successfully", name);
        Ok(())
    }

    async fn upsert(&self, record: &StorageRecord, key_field: &str) -> Result<(), LoadError> {
        let key = record.key(key_field).ok_or_else(|| {
            LoadError::Config(format!("key field `{key_field}` is not a text field"))
        })?;
        let doc_key = self.schema.document_key(key);

        let mut cmd = redis::cmd("HSET");
        cmd.arg(&doc_key);
        for (name, value) in record.fields() {
            cmd.arg(name);
            match value {
                FieldValue::Text(s) => cmd.arg(s),
                FieldValue::Blob(b) => cmd.arg(b),
            };
        }

        let mut conn = self.manager.clone();
        cmd.query_async::<()>(&mut conn)
            .await
            .map_err(|e| LoadError::Connection(format!("HSET {doc_key}: {e}")))?;

        trace!("HSET {}", doc_key);
        Ok(())
    }
}

fn is_unknown_index(e: &redis::RedisError) -> bool {
    is_unknown_index_reply(&e.to_string())
}

/// RediSearch reports a missing index with one of these replies depending on version.
fn is_unknown_index_reply(reply: &str) -> bool {
    let reply = reply.to_lowercase();
    reply.contains("unknown index name") || reply.contains("no such index")
}

/// Arguments following `FT.CREATE` for a hash index described by `schema`.
pub(crate) fn ft_create_args(schema: &IndexSchema) -> Vec<String> {
    let mut args: Vec<String> = vec![
        schema.name().to_string(),
        "ON".into(),
        "HASH".into(),
        "PREFIX".into(),
        "1".into(),
        format!("{}{}", schema.prefix(), schema.index.key_separator),
        "SCHEMA".into(),
    ];

    for f in &schema.fields {
        args.push(f.name.clone());
        match f.kind {
            FieldKind::Tag => {
                args.push("TAG".into());
                if let Some(sep) = &f.attrs.separator {
                    args.push("SEPARATOR".into());
                    args.push(sep.clone());
                }
            }
            FieldKind::Text => args.push("TEXT".into()),
            FieldKind::Numeric => args.push("NUMERIC".into()),
            FieldKind::Vector => {
                let algorithm = f.attrs.algorithm.unwrap_or(VectorAlgorithm::Flat);
                let metric = match f.attrs.distance_metric.unwrap_or(DistanceMetric::Cosine) {
                    DistanceMetric::Cosine => "COSINE",
                    DistanceMetric::L2 => "L2",
                    DistanceMetric::Ip => "IP",
                };

                let mut params: Vec<String> = vec![
                    "TYPE".into(),
                    "FLOAT32".into(),
                    "DIM".into(),
                    f.attrs.dims.unwrap_or_default().to_string(),
                    "DISTANCE_METRIC".into(),
                    metric.into(),
                ];
                if algorithm == VectorAlgorithm::Hnsw {
                    if let Some(m) = f.attrs.m {
                        params.extend(["M".into(), m.to_string()]);
                    }
                    if let Some(ef) = f.attrs.ef_construction {
                        params.extend(["EF_CONSTRUCTION".into(), ef.to_string()]);
                    }
                }

                args.push("VECTOR".into());
                args.push(
                    match algorithm {
                        VectorAlgorithm::Flat => "FLAT",
                        VectorAlgorithm::Hnsw => "HNSW",
                    }
                    .into(),
                );
                args.push(params.len().to_string());
                args.extend(params);
            }
        }
    }
    args
}
