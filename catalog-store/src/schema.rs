//! Index schema definition (YAML).
//!
//! The driver only reads the index name and vector dimensionality from here;
//! the rest is handed to the index service when it creates the index.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::LoadError;
use crate::record::VectorDims;

/// Index identity and key layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexInfo {
    /// Index name, e.g. `products`.
    pub name: String,
    /// Key prefix for stored documents; defaults to the index name.
    #[serde(default)]
    pub prefix: Option<String>,
    /// Separator between prefix and record key.
    #[serde(default = "default_key_separator")]
    pub key_separator: String,
}

fn default_key_separator() -> String {
    ":".to_string()
}

/// Field type as understood by the index service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Tag,
    Text,
    Numeric,
    Vector,
}

/// Vector index algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorAlgorithm {
    Flat,
    Hnsw,
}

/// Distance metric for a vector field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    Cosine,
    L2,
    Ip,
}

/// Optional per-field attributes; which ones apply depends on [`FieldKind`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldAttrs {
    pub dims: Option<usize>,
    pub algorithm: Option<VectorAlgorithm>,
    pub datatype: Option<String>,
    pub distance_metric: Option<DistanceMetric>,
    /// HNSW graph degree.
    pub m: Option<u32>,
    pub ef_construction: Option<u32>,
    /// Tag separator character.
    pub separator: Option<String>,
}

/// One schema field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default)]
    pub attrs: FieldAttrs,
}

/// Full index schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSchema {
    pub index: IndexInfo,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

impl IndexSchema {
    /// Loads and validates a schema from a YAML file.
    ///
    /// # Errors
    /// [`LoadError::Config`] if the file is unreadable, not valid YAML, or fails validation.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        debug!("Loading index schema {:?}", path);
        let data = std::fs::read_to_string(path)
            .map_err(|e| LoadError::Config(format!("schema {}: {e}", path.display())))?;
        Self::from_yaml_str(&data)
            .map_err(|e| LoadError::Config(format!("schema {}: {e}", path.display())))
    }

    /// Parses and validates a schema from YAML text.
    pub fn from_yaml_str(data: &str) -> Result<Self, String> {
        let schema: IndexSchema = serde_yml::from_str(data).map_err(|e| e.to_string())?;
        schema.validate()?;
        Ok(schema)
    }

    fn validate(&self) -> Result<(), String> {
        if self.index.name.trim().is_empty() {
            return Err("index.name is empty".into());
        }
        let mut seen = HashSet::new();
        for f in &self.fields {
            if !seen.insert(f.name.as_str()) {
                return Err(format!("duplicate field `{}`", f.name));
            }
            if f.kind != FieldKind::Vector {
                continue;
            }
            match f.attrs.dims {
                Some(d) if d > 0 => {}
                _ => return Err(format!("vector field `{}` needs attrs.dims > 0", f.name)),
            }
            if let Some(dt) = &f.attrs.datatype {
                if !dt.eq_ignore_ascii_case("float32") {
                    return Err(format!(
                        "vector field `{}`: datatype {dt} unsupported, vectors are stored as float32",
                        f.name
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.index.name
    }

    /// Key prefix, falling back to the index name.
    pub fn prefix(&self) -> &str {
        self.index.prefix.as_deref().unwrap_or(&self.index.name)
    }

    /// Storage key for a record: `<prefix><separator><key>`.
    pub fn document_key(&self, key: &str) -> String {
        format!("{}{}{}", self.prefix(), self.index.key_separator, key)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Declared dimensionality of the image and text vectors, if any.
    pub fn vector_dims(&self) -> VectorDims {
        let dims = |name: &str| {
            self.field(name)
                .filter(|f| f.kind == FieldKind::Vector)
                .and_then(|f| f.attrs.dims)
        };
        VectorDims {
            img: dims("img_vector"),
            text: dims("text_vector"),
        }
    }
}
