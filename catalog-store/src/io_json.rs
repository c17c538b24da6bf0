//! Catalog reader: the whole `product_vectors.json` array into memory.
//!
//! The catalog is a single JSON document whose root is an array of product
//! objects. It is read eagerly; no streaming is attempted.

use crate::errors::LoadError;
use crate::record::RawProduct;
use serde_json::Value;
use std::io::BufReader;
use std::{fs::File, path::Path};
use tracing::{debug, info};

/// Reads every product of the catalog at `path`.
///
/// # Errors
/// - [`LoadError::Read`] if the file is missing, unreadable, or not valid JSON.
/// - [`LoadError::Shape`] if the document root is not an array.
pub fn read_catalog(path: impl AsRef<Path>) -> Result<Vec<RawProduct>, LoadError> {
    let path = path.as_ref();
    info!("Reading product catalog: {:?}", path);

    let read_err = |reason: String| LoadError::Read {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path).map_err(|e| read_err(e.to_string()))?;
    let root: Value =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| read_err(e.to_string()))?;

    let products = match root {
        Value::Array(items) => items,
        other => {
            return Err(LoadError::shape(
                "<root>",
                format!("catalog root must be an array, found {}", json_kind(&other)),
            ));
        }
    };

    debug!("Loaded {} raw products", products.len());
    Ok(products)
}

/// Short JSON type name for error messages.
pub(crate) fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
