//! Runtime configuration: reads loader settings from environment variables
//! and exposes them as one explicit value handed to the driver.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::errors::LoadError;

/// File name of the catalog inside `data_location`.
pub const CATALOG_FILE_NAME: &str = "product_vectors.json";

/// Configuration for a catalog load.
#[derive(Clone, Debug)]
pub struct LoaderConfig {
    /// Redis endpoint, e.g. `redis://localhost:6379`.
    pub redis_url: String,
    /// Directory holding `product_vectors.json`.
    pub data_location: PathBuf,
    /// YAML index schema definition.
    pub schema_path: PathBuf,
    /// Maximum number of in-flight upserts.
    pub write_concurrency: usize,
    /// Draw a progress bar while writing.
    pub show_progress: bool,
}

impl LoaderConfig {
    /// Creates a config with defaults for everything but the endpoint and data directory.
    pub fn new_default(url: impl Into<String>, data_location: impl Into<PathBuf>) -> Self {
        Self {
            redis_url: url.into(),
            data_location: data_location.into(),
            schema_path: PathBuf::from("schema/products.yaml"),
            write_concurrency: 20,
            show_progress: false,
        }
    }

    /// Build configuration from environment variables.
    ///
    /// Environment variables used:
    /// - `REDIS_URL` (default: "redis://localhost:6379")
    /// - `DATA_LOCATION` (default: "data")
    /// - `INDEX_SCHEMA_PATH` (default: "schema/products.yaml")
    /// - `WRITE_CONCURRENCY` (default: 20, must be > 0)
    /// - `LOAD_PROGRESS` (default: true)
    pub fn from_env() -> Result<Self, LoadError> {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".into());
        let data_location = std::env::var("DATA_LOCATION")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));
        let schema_path = std::env::var("INDEX_SCHEMA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("schema/products.yaml"));

        let write_concurrency = match read_i64_env("WRITE_CONCURRENCY")? {
            Some(n) if n > 0 => n as usize,
            Some(n) => {
                return Err(LoadError::Config(format!(
                    "WRITE_CONCURRENCY must be > 0, got {n}"
                )));
            }
            None => 20,
        };
        let show_progress = read_bool_env("LOAD_PROGRESS")?.unwrap_or(true);

        let cfg = Self {
            redis_url,
            data_location,
            schema_path,
            write_concurrency,
            show_progress,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates config values. Runs before any I/O.
    pub fn validate(&self) -> Result<(), LoadError> {
        if self.redis_url.trim().is_empty() {
            return Err(LoadError::Config("redis_url is empty".into()));
        }
        self.concurrency()?;
        Ok(())
    }

    /// Write concurrency as a checked non-zero value.
    pub fn concurrency(&self) -> Result<NonZeroUsize, LoadError> {
        NonZeroUsize::new(self.write_concurrency)
            .ok_or_else(|| LoadError::Config("write_concurrency must be > 0".into()))
    }

    /// Full path of the catalog file.
    pub fn catalog_path(&self) -> PathBuf {
        catalog_path_in(&self.data_location)
    }
}

/// `<dir>/product_vectors.json`.
pub fn catalog_path_in(dir: impl AsRef<Path>) -> PathBuf {
    dir.as_ref().join(CATALOG_FILE_NAME)
}

/// Loads `path` into the process environment when the file exists.
///
/// Returns the loaded path, or `None` if there is no such file. A file that
/// exists but cannot be read or parsed is a config error.
pub fn load_dotenv(path: impl AsRef<Path>) -> Result<Option<PathBuf>, LoadError> {
    let path = path.as_ref();
    match dotenvy::from_path(path) {
        Ok(()) => Ok(Some(path.to_path_buf())),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(LoadError::Config(format!("{}: {e}", path.display()))),
    }
}

/// Read an optional `i64` from env; unset is `None`, garbage is an error.
fn read_i64_env(key: &str) -> Result<Option<i64>, LoadError> {
    match std::env::var(key) {
        Ok(v) => v
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| LoadError::Config(format!("failed to parse env variable: {key} = '{v}'"))),
        Err(_) => Ok(None),
    }
}

/// Read an optional `bool` from env.
fn read_bool_env(key: &str) -> Result<Option<bool>, LoadError> {
    match std::env::var(key) {
        Ok(v) => match v.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(LoadError::Config(format!(
                "failed to parse env variable: {key} = '{v}'"
            ))),
        },
        Err(_) => Ok(None),
    }
}
