//! `f32` vector blobs: native byte order, no header, no padding.

use crate::errors::LoadError;

/// Width of one encoded element.
pub const F32_WIDTH: usize = std::mem::size_of::<f32>();

/// Concatenates the native-endian bytes of every element, in order.
pub fn encode_f32_blob(values: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * F32_WIDTH);
    for v in values {
        out.extend_from_slice(&v.to_ne_bytes());
    }
    out
}

/// Inverse of [`encode_f32_blob`].
///
/// # Errors
/// [`LoadError::Encoding`] if the blob length is not a multiple of 4.
pub fn decode_f32_blob(blob: &[u8]) -> Result<Vec<f32>, LoadError> {
    if blob.len() % F32_WIDTH != 0 {
        return Err(LoadError::Encoding {
            record: "<blob>".into(),
            field: "bytes".into(),
            position: blob.len(),
            reason: format!("length is not a multiple of {F32_WIDTH}"),
        });
    }
    Ok(blob
        .chunks_exact(F32_WIDTH)
        .filter_map(|c| <[u8; F32_WIDTH]>::try_from(c).ok())
        .map(f32::from_ne_bytes)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_at_f32_precision() {
        let v = [0.0_f32, -1.5, 3.25e-7, f32::MAX, f32::MIN_POSITIVE, 0.1];
        let blob = encode_f32_blob(&v);
        assert_eq!(blob.len(), v.len() * 4);
        assert_eq!(decode_f32_blob(&blob).unwrap(), v);
    }

    #[test]
    fn layout_is_native_endian_element_major() {
        let blob = encode_f32_blob(&[1.0, 2.0]);
        assert_eq!(&blob[..4], &1.0_f32.to_ne_bytes());
        assert_eq!(&blob[4..], &2.0_f32.to_ne_bytes());
    }

    #[test]
    fn decodes_each_four_byte_chunk() {
        let mut blob = Vec::new();
        for v in [0.5_f32, -2.0, 7.25] {
            blob.extend_from_slice(&v.to_ne_bytes());
        }
        assert_eq!(decode_f32_blob(&blob).unwrap(), vec![0.5_f32, -2.0, 7.25]);
    }

    #[test]
    fn ragged_blob_is_rejected() {
        assert!(matches!(
            decode_f32_blob(&[0, 0, 0]),
            Err(LoadError::Encoding { .. })
        ));
        assert!(decode_f32_blob(&[]).unwrap().is_empty());
    }
}
