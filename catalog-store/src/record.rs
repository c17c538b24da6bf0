//! Core data models used by the library.

use serde_json::Value;

/// One catalog entry exactly as read from disk.
///
/// Kept untyped so the transformer can report precisely which field is missing.
pub type RawProduct = Value;

/// Name of the primary-key field used for upserts.
pub const KEY_FIELD: &str = "product_id";

/// Storage-ready record: tag fields plus vectors encoded as `f32` blobs.
#[derive(Clone, Debug, PartialEq)]
pub struct StorageRecord {
    pub product_id: String,
    pub gender: String,
    pub category: String,
    /// `4 * D_img` bytes, native-endian `f32`s.
    pub img_vector: Vec<u8>,
    /// `4 * D_text` bytes, native-endian `f32`s.
    pub text_vector: Vec<u8>,
}

/// A single field value of a [`StorageRecord`], addressed by name.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Blob(&'a [u8]),
}

impl StorageRecord {
    /// Field names in storage order.
    pub const FIELDS: [&'static str; 5] =
        ["product_id", "gender", "category", "img_vector", "text_vector"];

    /// Looks up a field by its storage name.
    pub fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "product_id" => Some(FieldValue::Text(&self.product_id)),
            "gender" => Some(FieldValue::Text(&self.gender)),
            "category" => Some(FieldValue::Text(&self.category)),
            "img_vector" => Some(FieldValue::Blob(&self.img_vector)),
            "text_vector" => Some(FieldValue::Blob(&self.text_vector)),
            _ => None,
        }
    }

    /// String value of `key_field`, if it names a text field.
    pub fn key(&self, key_field: &str) -> Option<&str> {
        match self.field(key_field)? {
            FieldValue::Text(s) => Some(s),
            FieldValue::Blob(_) => None,
        }
    }

    /// All fields paired with their names, in storage order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, FieldValue<'_>)> {
        Self::FIELDS
            .into_iter()
            .filter_map(move |name| self.field(name).map(|v| (name, v)))
    }
}

/// Expected vector dimensionality for the two embedding kinds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VectorDims {
    pub img: Option<usize>,
    pub text: Option<usize>,
}

/// Result of a catalog load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Index already existed; nothing was created or written.
    Skipped { index: String },
    /// Index was (re)created and every record was written.
    Loaded { index: String, records: usize },
}
