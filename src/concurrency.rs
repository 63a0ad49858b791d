//! Concurrency helpers: ordered, bounded fan-out over files and run cancellation.

use crate::error::{ExtractError, Result};
use crate::paths::FileJob;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag a caller sets to stop a run. Clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(ExtractError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Map `f` over `files`, at most `limit` in flight, returning results in
/// `files` order regardless of completion order.
///
/// `before_chunk` runs ahead of each chunk dispatch and may stop the run.
/// Within a chunk every started file finishes; the first error in file order
/// is returned and later chunks are not started.
pub fn map_files_ordered<T, F, B>(files: &[FileJob], limit: usize, mut before_chunk: B, f: F) -> Result<Vec<T>>
where
    T: Send,
    F: Sync + Fn(&FileJob) -> Result<T>,
    B: FnMut() -> Result<()>,
{
    let mut out = Vec::with_capacity(files.len());
    if limit <= 1 {
        for job in files {
            before_chunk()?;
            out.push(f(job)?);
        }
        return Ok(out);
    }
    for chunk in files.chunks(limit) {
        before_chunk()?;
        let results: Vec<Result<T>> = chunk.par_iter().map(|job| f(job)).collect();
        for r in results {
            out.push(r?);
        }
    }
    Ok(out)
}
