//! Unified error types for the crate.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error for catalog loading.
///
/// Every variant is fatal to a run; the message always names the failing stage.
#[derive(Debug, Error)]
pub enum LoadError {
    // ── Configuration / environment ──────────────────────────────────────────
    /// Invalid concurrency, unparseable env value, or unusable schema definition.
    #[error("config error: {0}")]
    Config(String),

    // ── Catalog source ──────────────────────────────────────────────────────
    /// Catalog file is missing, unreadable, or not valid JSON.
    #[error("read error: {}: {reason}", .path.display())]
    Read { path: PathBuf, reason: String },

    // ── Record transform ────────────────────────────────────────────────────
    /// A record (or the catalog root) does not have the expected shape.
    #[error("shape error: record {record}: {reason}")]
    Shape { record: String, reason: String },

    /// A vector element cannot be stored as a finite 32-bit float.
    #[error("encoding error: record {record}: {field}[{position}] {reason}")]
    Encoding {
        record: String,
        field: String,
        position: usize,
        reason: String,
    },

    // ── Index service ───────────────────────────────────────────────────────
    /// Index service unreachable, or it rejected connect / exists / create.
    #[error("connection error: {0}")]
    Connection(String),

    /// One or more upserts failed; reported once after all writes settled.
    #[error("write error: {failed} of {total} records failed (first: {first_key}: {reason})")]
    Write {
        failed: usize,
        total: usize,
        first_key: String,
        reason: String,
    },
}

impl LoadError {
    /// Pipeline stage the error belongs to, for operator-facing messages.
    pub fn stage(&self) -> &'static str {
        match self {
            LoadError::Config(_) => "config",
            LoadError::Read { .. } => "read",
            LoadError::Shape { .. } => "shape",
            LoadError::Encoding { .. } => "encoding",
            LoadError::Connection(_) => "connection",
            LoadError::Write { .. } => "write",
        }
    }

    /// Process exit code for this failure. Never zero.
    pub fn exit_code(&self) -> u8 {
        match self {
            LoadError::Config(_) => 2,
            LoadError::Read { .. } => 3,
            LoadError::Shape { .. } => 4,
            LoadError::Encoding { .. } => 5,
            LoadError::Connection(_) => 6,
            LoadError::Write { .. } => 7,
        }
    }

    pub(crate) fn shape(record: impl Into<String>, reason: impl Into<String>) -> Self {
        LoadError::Shape {
            record: record.into(),
            reason: reason.into(),
        }
    }
}
