//! In-memory index service used by unit tests.
//!
//! Records every call and tracks how many upserts overlap.

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::blob::encode_f32_blob;
use crate::config::{LoaderConfig, catalog_path_in};
use crate::errors::LoadError;
use crate::index::{IndexConnector, IndexService};
use crate::record::StorageRecord;
use crate::schema::IndexSchema;

#[derive(Default)]
struct State {
    exists: AtomicBool,
    creates: AtomicUsize,
    upserts: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    written: Mutex<Vec<StorageRecord>>,
    fail_keys: Mutex<HashSet<String>>,
    delay: Mutex<Option<Duration>>,
}

/// Cloneable handle; clones share state.
#[derive(Clone, Default)]
pub(crate) struct FakeIndex {
    state: Arc<State>,
}

impl FakeIndex {
    pub(crate) fn existing() -> Self {
        let idx = Self::default();
        idx.state.exists.store(true, Ordering::SeqCst);
        idx
    }

    pub(crate) fn with_delay(self, delay: Duration) -> Self {
        *self.state.delay.lock().unwrap() = Some(delay);
        self
    }

    pub(crate) fn failing_on<const N: usize>(self, keys: [&str; N]) -> Self {
        self.state
            .fail_keys
            .lock()
            .unwrap()
            .extend(keys.iter().map(|k| k.to_string()));
        self
    }

    pub(crate) fn creates(&self) -> usize {
        self.state.creates.load(Ordering::SeqCst)
    }

    pub(crate) fn upserts(&self) -> usize {
        self.state.upserts.load(Ordering::SeqCst)
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn written(&self) -> Vec<StorageRecord> {
        self.state.written.lock().unwrap().clone()
    }

    pub(crate) fn written_keys(&self) -> HashSet<String> {
        self.written().into_iter().map(|r| r.product_id).collect()
    }
}

#[async_trait]
impl IndexService for FakeIndex {
    async fn exists(&self) -> Result<bool, LoadError> {
        Ok(self.state.exists.load(Ordering::SeqCst))
    }

    async fn create(&self, overwrite: bool) -> Result<(), LoadError> {
        if self.state.exists.load(Ordering::SeqCst) && !overwrite {
            return Err(LoadError::Connection("index already exists".into()));
        }
        self.state.creates.fetch_add(1, Ordering::SeqCst);
        self.state.written.lock().unwrap().clear();
        self.state.exists.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn upsert(&self, record: &StorageRecord, key_field: &str) -> Result<(), LoadError> {
        let s = &self.state;
        s.upserts.fetch_add(1, Ordering::SeqCst);
        let now = s.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        s.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = *s.delay.lock().unwrap();
        match delay {
            Some(d) => tokio::time::sleep(d).await,
            None => tokio::task::yield_now().await,
        }

        s.in_flight.fetch_sub(1, Ordering::SeqCst);

        let key = record
            .key(key_field)
            .ok_or_else(|| LoadError::Config(format!("bad key field {key_field}")))?;
        if s.fail_keys.lock().unwrap().contains(key) {
            return Err(LoadError::Connection(format!("HSET {key}: connection reset")));
        }
        s.written.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// Hands out clones of one [`FakeIndex`] and counts connects.
#[derive(Default)]
pub(crate) struct FakeConnector {
    pub(crate) index: FakeIndex,
    pub(crate) connects: AtomicUsize,
    pub(crate) unreachable: bool,
}

impl FakeConnector {
    pub(crate) fn new(index: FakeIndex) -> Self {
        Self {
            index,
            ..Default::default()
        }
    }

    pub(crate) fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IndexConnector for FakeConnector {
    type Index = FakeIndex;

    async fn connect(&self, endpoint: &str, _schema: &IndexSchema) -> Result<FakeIndex, LoadError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.unreachable {
            return Err(LoadError::Connection(format!("{endpoint}: connection refused")));
        }
        Ok(self.index.clone())
    }
}

/// Storage record with constant vectors of the given dimensions.
pub(crate) fn record(id: &str, img_dim: usize, text_dim: usize) -> StorageRecord {
    StorageRecord {
        product_id: id.to_string(),
        gender: "Women".into(),
        category: "Apparel".into(),
        img_vector: encode_f32_blob(&vec![0.5; img_dim]),
        text_vector: encode_f32_blob(&vec![-0.5; text_dim]),
    }
}

/// Raw catalog entry with vectors of the given dimensions.
pub(crate) fn raw_product(id: &str, img_dim: usize, text_dim: usize) -> Value {
    let img: Vec<f64> = (0..img_dim).map(|i| i as f64 * 0.125).collect();
    let text: Vec<f64> = (0..text_dim).map(|i| 1.0 - i as f64 * 0.25).collect();
    json!({
        "product_id": id,
        "product_metadata": {
            "gender": "Women",
            "master_category": "Apparel",
            "name": format!("Product {id}")
        },
        "img_vector": img,
        "text_vector": text
    })
}

/// Writes `schema.yaml` and `product_vectors.json` into `dir`, returning a config for them.
pub(crate) fn fixture(dir: &Path, catalog: &Value, concurrency: usize) -> LoaderConfig {
    let schema_path = dir.join("schema.yaml");
    std::fs::write(&schema_path, crate::schema::tests::PRODUCTS_YAML).unwrap();
    std::fs::write(catalog_path_in(dir), catalog.to_string()).unwrap();

    let mut cfg = LoaderConfig::new_default("redis://fake:6379", dir);
    cfg.schema_path = schema_path;
    cfg.write_concurrency = concurrency;
    cfg
}
