//! Bounded upsert executor with failure aggregation.

use std::num::NonZeroUsize;

use crate::{errors::LoadError, index::IndexService, record::StorageRecord};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

/// Knobs for [`upsert_bounded`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriteOptions {
    /// Maximum number of upserts in flight.
    pub concurrency: NonZeroUsize,
    /// Draw a progress bar on stderr.
    pub show_progress: bool,
}

impl WriteOptions {
    pub fn new(concurrency: NonZeroUsize) -> Self {
        Self {
            concurrency,
            show_progress: false,
        }
    }
}

/// Upserts all records through `index` with at most `opts.concurrency` calls in flight.
///
/// Every upsert is awaited, even after a failure, so the caller gets one
/// verdict for the whole batch.
///
/// # Errors
/// Returns [`LoadError::Write`] naming the failure count and the first failing
/// key (in catalog order).
pub async fn upsert_bounded<I>(
    index: &I,
    records: Vec<StorageRecord>,
    key_field: &str,
    opts: WriteOptions,
) -> Result<usize, LoadError>
where
    I: IndexService + ?Sized,
{
    let total = records.len();
    info!(
        "write_pool::upsert_bounded: total={} concurrency={}",
        total, opts.concurrency
    );

    if total == 0 {
        debug!("write_pool::upsert_bounded: nothing to write");
        return Ok(0);
    }

    let pb = progress_bar(total, opts.show_progress);

    let outcomes: Vec<Option<(usize, String, String)>> = stream::iter(records.into_iter().enumerate())
        .map(|(i, r)| {
            let pb = &pb;
            async move {
                let res = index.upsert(&r, key_field).await;
                pb.inc(1);
                res.err().map(|e| {
                    let key = r.key(key_field).unwrap_or(&r.product_id).to_string();
                    (i, key, e.to_string())
                })
            }
        })
        .buffer_unordered(opts.concurrency.get())
        .collect()
        .await;

    let mut failures: Vec<(usize, String, String)> = outcomes.into_iter().flatten().collect();

    if failures.is_empty() {
        pb.finish_with_message("Upsert complete");
        debug!("write_pool::upsert_bounded: {} records written", total);
        return Ok(total);
    }

    pb.abandon();
    failures.sort_by_key(|(i, _, _)| *i);
    let failed = failures.len();
    warn!("write_pool::upsert_bounded: {failed} of {total} upserts failed");
    let (_, first_key, reason) = failures.swap_remove(0);
    Err(LoadError::Write {
        failed,
        total,
        first_key,
        reason,
    })
}

const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta}) {msg}";

fn progress_bar(total: usize, show: bool) -> ProgressBar {
    if !show {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total as u64);
    if let Ok(style) = ProgressStyle::with_template(PROGRESS_TEMPLATE) {
        pb.set_style(style.progress_chars("##-"));
    }
    pb
}
