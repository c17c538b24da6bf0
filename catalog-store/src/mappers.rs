//! Mappers turning raw catalog JSON into storage-ready [`StorageRecord`]s.
//!
//! `map_product` is pure and record-local; `map_catalog` applies it to the
//! whole catalog and enforces one vector length per embedding kind.

use crate::blob::encode_f32_blob;
use crate::errors::LoadError;
use crate::io_json::json_kind;
use crate::record::{RawProduct, StorageRecord, VectorDims};
use serde_json::{Map, Value};
use tracing::{debug, trace};

/// Maps one raw product into a [`StorageRecord`].
///
/// `position` is the index in the catalog array, used to identify records
/// whose `product_id` is itself unusable.
///
/// # Errors
/// - [`LoadError::Shape`] if `product_id`, `product_metadata.gender`,
///   `product_metadata.master_category`, or a vector field is missing or mistyped.
/// - [`LoadError::Encoding`] if a vector element is not a finite `f32`.
pub fn map_product(raw: &RawProduct, position: usize) -> Result<StorageRecord, LoadError> {
    let at = || format!("#{position}");

    let obj = raw.as_object().ok_or_else(|| {
        LoadError::shape(at(), format!("expected object, found {}", json_kind(raw)))
    })?;

    let product_id = obj
        .get("product_id")
        .and_then(Value::as_str)
        .ok_or_else(|| LoadError::shape(at(), "missing string field `product_id`"))?
        .to_string();

    let meta = obj
        .get("product_metadata")
        .and_then(Value::as_object)
        .ok_or_else(|| LoadError::shape(&product_id, "missing object `product_metadata`"))?;
    let gender = meta_str(meta, "gender", &product_id)?;
    let category = meta_str(meta, "master_category", &product_id)?;

    let img = vector_f32(obj, "img_vector", &product_id)?;
    let text = vector_f32(obj, "text_vector", &product_id)?;

    trace!(
        "mapped {} img_dim={} text_dim={}",
        product_id,
        img.len(),
        text.len()
    );

    Ok(StorageRecord {
        product_id,
        gender,
        category,
        img_vector: encode_f32_blob(&img),
        text_vector: encode_f32_blob(&text),
    })
}

/// Maps every product, failing on the first bad record.
///
/// Vector lengths must match `dims`; an unset dimension is pinned by the
/// first record that carries that vector.
pub fn map_catalog(
    raws: &[RawProduct],
    dims: VectorDims,
) -> Result<Vec<StorageRecord>, LoadError> {
    let mut want = dims;
    let mut out = Vec::with_capacity(raws.len());

    for (i, raw) in raws.iter().enumerate() {
        let rec = map_product(raw, i)?;
        check_dim(&rec, "img_vector", rec.img_vector.len(), &mut want.img)?;
        check_dim(&rec, "text_vector", rec.text_vector.len(), &mut want.text)?;
        out.push(rec);
    }

    debug!(
        "Mapped {} products (img_dim={:?}, text_dim={:?})",
        out.len(),
        want.img,
        want.text
    );
    Ok(out)
}

fn meta_str(meta: &Map<String, Value>, key: &str, id: &str) -> Result<String, LoadError> {
    meta.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            LoadError::shape(id, format!("missing string field `product_metadata.{key}`"))
        })
}

/// Reads a numeric array as `f32`s, rejecting anything that would not survive storage.
fn vector_f32(obj: &Map<String, Value>, key: &str, id: &str) -> Result<Vec<f32>, LoadError> {
    let arr = match obj.get(key) {
        Some(Value::Array(a)) => a,
        Some(other) => {
            return Err(LoadError::shape(
                id,
                format!("`{key}` must be an array, found {}", json_kind(other)),
            ));
        }
        None => return Err(LoadError::shape(id, format!("missing array `{key}`"))),
    };

    let bad = |position: usize, reason: String| LoadError::Encoding {
        record: id.to_string(),
        field: key.to_string(),
        position,
        reason,
    };

    let mut out = Vec::with_capacity(arr.len());
    for (i, x) in arr.iter().enumerate() {
        let f = x
            .as_f64()
            .ok_or_else(|| bad(i, format!("is {}, not a number", json_kind(x))))?;
        let v = f as f32;
        if !v.is_finite() {
            return Err(bad(i, format!("value {f} is not a finite f32")));
        }
        out.push(v);
    }
    Ok(out)
}

fn check_dim(
    rec: &StorageRecord,
    field: &str,
    blob_len: usize,
    want: &mut Option<usize>,
) -> Result<(), LoadError> {
    let got = blob_len / crate::blob::F32_WIDTH;
    match *want {
        Some(w) if w != got => Err(LoadError::shape(
            &rec.product_id,
            format!("`{field}` has {got} dimensions, want {w}"),
        )),
        Some(_) => Ok(()),
        None => {
            *want = Some(got);
            Ok(())
        }
    }
}
