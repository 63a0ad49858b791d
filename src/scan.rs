//! Per-file reading: footer schema, column projection, timed read, dedupe.

use crate::dedupe::dedupe_batch;
use crate::error::{ExtractError, FileReadSource, Result};
use crate::paths::list_data_files;
use crate::progress::ProgressReporter;
use crate::util::open_with_backoff;
use arrow::compute::concat_batches;
use arrow::datatypes::{Schema, SchemaRef};
use arrow::record_batch::{RecordBatch, RecordBatchReader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ProjectionMask;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::time::Duration;

const OPEN_BACKOFF_MS: u64 = 50;

/// Reader settings shared by every file of a run.
#[derive(Clone, Debug)]
pub struct ScanOptions {
    pub batch_size: usize,
    pub read_timeout: Option<Duration>,
    pub open_retries: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self { batch_size: 8192, read_timeout: None, open_retries: 1 }
    }
}

fn open_builder(path: &Path, retries: usize) -> Result<ParquetRecordBatchReaderBuilder<std::fs::File>> {
    let file = open_with_backoff(path, retries, OPEN_BACKOFF_MS).map_err(|e| ExtractError::file_read(path, e))?;
    ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| ExtractError::file_read(path, e))
}

/// Read only the footer of `path` and return its Arrow schema. No row data is decoded.
pub fn read_schema(path: &Path, retries: usize) -> Result<SchemaRef> {
    Ok(open_builder(path, retries)?.schema().clone())
}

/// `desired` filtered to the columns `available` has, keeping `desired` order.
pub fn project_columns(desired: &[String], available: &Schema) -> Vec<String> {
    desired
        .iter()
        .filter(|name| available.column_with_name(name).is_some())
        .cloned()
        .collect()
}

/// Read the requested-and-available columns of one file, in `desired` order.
///
/// Only the projected column chunks are decoded. A file carrying none of the
/// requested columns yields an empty, column-less batch without reading rows.
pub fn read_projected(path: &Path, desired: &[String], opts: &ScanOptions) -> Result<RecordBatch> {
    let builder = open_builder(path, opts.open_retries)?;
    let file_schema = builder.schema().clone();
    let projected = project_columns(desired, &file_schema);
    if projected.is_empty() {
        tracing::debug!("{}: none of the requested columns present", path.display());
        return Ok(RecordBatch::new_empty(Arc::new(Schema::empty())));
    }

    let mut roots: Vec<usize> = projected
        .iter()
        .filter_map(|name| file_schema.index_of(name).ok())
        .collect();
    roots.sort_unstable();
    roots.dedup();
    let mask = ProjectionMask::roots(builder.parquet_schema(), roots);

    let reader = builder
        .with_batch_size(opts.batch_size)
        .with_projection(mask)
        .build()
        .map_err(|e| ExtractError::file_read(path, e))?;
    let read_schema = reader.schema();
    let batches = reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| ExtractError::file_read(path, e))?;
    let whole = concat_batches(&read_schema, &batches).map_err(|e| ExtractError::file_read(path, e))?;

    // The reader yields file order; put columns back in requested order.
    let order = projected
        .iter()
        .map(|name| whole.schema().index_of(name))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| ExtractError::file_read(path, e))?;
    whole.project(&order).map_err(|e| ExtractError::file_read(path, e))
}

/// [`read_projected`], bounded by `opts.read_timeout` when one is set.
///
/// The read runs on a helper thread; on expiry the caller stops waiting and the
/// helper drops its file handle once the blocked call returns.
pub fn read_with_timeout(path: &Path, desired: &[String], opts: &ScanOptions) -> Result<RecordBatch> {
    let Some(timeout) = opts.read_timeout else {
        return read_projected(path, desired, opts);
    };
    let (tx, rx) = mpsc::sync_channel(1);
    let owned_path: PathBuf = path.to_path_buf();
    let owned_desired = desired.to_vec();
    let owned_opts = opts.clone();
    std::thread::Builder::new()
        .name("pqx-read".into())
        .spawn(move || {
            let _ = tx.send(read_projected(&owned_path, &owned_desired, &owned_opts));
        })
        .map_err(|e| ExtractError::file_read(path, e))?;

    match rx.recv_timeout(timeout) {
        Ok(res) => res,
        Err(mpsc::RecvTimeoutError::Timeout) => Err(ExtractError::ReadTimeout { path: path.to_path_buf(), timeout }),
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(ExtractError::FileRead {
            path: path.to_path_buf(),
            source: FileReadSource::Io(std::io::Error::new(std::io::ErrorKind::Other, "reader thread terminated")),
        }),
    }
}

/// Per-file result: projected columns in desired order, exact duplicates removed.
pub fn scan_file(path: &Path, desired: &[String], opts: &ScanOptions) -> Result<RecordBatch> {
    let batch = read_with_timeout(path, desired, opts)?;
    let before = batch.num_rows();
    let deduped = dedupe_batch(&batch)?;
    tracing::debug!(
        "{}: {} columns, {} rows ({} duplicates dropped)",
        path.display(),
        deduped.num_columns(),
        deduped.num_rows(),
        before - deduped.num_rows()
    );
    Ok(deduped)
}

/// Scan every data file of one folder in file-name order, ticking `progress`
/// once per file. Fails on the first unreadable file.
pub fn scan_folder(
    folder: &Path,
    desired: &[String],
    ext: &str,
    opts: &ScanOptions,
    progress: &ProgressReporter,
) -> Result<Vec<RecordBatch>> {
    let files = list_data_files(folder, ext)?;
    let mut out = Vec::with_capacity(files.len());
    for path in &files {
        let res = scan_file(path, desired, opts);
        progress.tick();
        out.push(res?);
    }
    Ok(out)
}
