use crate::aggregate::merge_tables;
use crate::concurrency::{map_files_ordered, CancelToken};
use crate::config::{ErrorPolicy, ExtractOptions, YearFolderPolicy};
use crate::error::{ExtractError, Result};
use crate::export::export_csv;
use crate::mem::throttle_low_memory;
use crate::paths::{plan_files, resolve_folders_with, validate_range};
use crate::progress::{ProgressReporter, Suspend, ThreadYield};
use crate::scan::{scan_file, ScanOptions};
use crate::util::init_tracing_once;
use arrow::record_batch::RecordBatch;
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Summary of one extraction run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ExtractReport {
    pub folders: Vec<String>,
    pub files_total: usize,
    pub files_read: usize,
    pub files_skipped: usize,
    pub rows: usize,
    pub columns: Vec<String>,
}

type SharedCallback = Arc<dyn Fn(f64) + Send + Sync>;

/// Extraction pipeline: resolve folders, plan files, scan each file with
/// projection and dedupe, merge, and optionally export.
#[derive(Clone)]
pub struct Extractor {
    pub(crate) opts: ExtractOptions,
    on_progress: Option<SharedCallback>,
    suspend: Arc<dyn Suspend>,
    cancel: CancelToken,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor {
    pub fn new() -> Self {
        Self { opts: ExtractOptions::default(), on_progress: None, suspend: Arc::new(ThreadYield), cancel: CancelToken::new() }
    }

    pub fn from_options(opts: ExtractOptions) -> Self {
        Self { opts, ..Self::new() }
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.opts
    }

    // -------- Builder methods --------
    pub fn base_dir(mut self, base: impl AsRef<Path>) -> Self { self.opts = self.opts.with_base_dir(base); self }
    pub fn date_range(mut self, start: impl Into<String>, end: impl Into<String>) -> Self { self.opts = self.opts.with_date_range(start, end); self }
    pub fn columns<I, S>(mut self, columns: I) -> Self where I: IntoIterator<Item = S>, S: Into<String> { self.opts = self.opts.with_columns(columns); self }
    pub fn extension(mut self, ext: impl AsRef<str>) -> Self { self.opts = self.opts.with_extension(ext); self }
    pub fn error_policy(mut self, policy: ErrorPolicy) -> Self { self.opts = self.opts.with_error_policy(policy); self }
    pub fn skip_unreadable(self, yes: bool) -> Self { self.error_policy(if yes { ErrorPolicy::Skip } else { ErrorPolicy::FailFast }) }
    pub fn year_folders(mut self, policy: YearFolderPolicy) -> Self { self.opts = self.opts.with_year_folders(policy); self }
    pub fn parallelism(mut self, threads: usize) -> Self { self.opts = self.opts.with_parallelism(threads); self }
    pub fn file_concurrency(mut self, n: usize) -> Self { self.opts = self.opts.with_file_concurrency(n); self }
    pub fn read_timeout(mut self, timeout: Option<Duration>) -> Self { self.opts = self.opts.with_read_timeout(timeout); self }
    pub fn open_retries(mut self, tries: usize) -> Self { self.opts = self.opts.with_open_retries(tries); self }
    pub fn batch_size(mut self, rows: usize) -> Self { self.opts = self.opts.with_batch_size(rows); self }
    pub fn progress(mut self, yes: bool) -> Self { self.opts = self.opts.with_progress(yes); self }
    pub fn progress_label(mut self, label: impl Into<String>) -> Self { self.opts = self.opts.with_progress_label(label); self }
    pub fn low_memory_threshold(mut self, frac: f64) -> Self { self.opts = self.opts.with_low_memory_threshold(frac); self }

    /// Called with the completion fraction after every file.
    pub fn on_progress(mut self, cb: impl Fn(f64) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(cb));
        self
    }

    /// Replace the per-file suspension point (default: yield the thread).
    pub fn suspend_with(mut self, suspend: Arc<dyn Suspend>) -> Self {
        self.suspend = suspend;
        self
    }

    /// Token the caller can trigger to stop the run before the next file read.
    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    fn reporter(&self) -> ProgressReporter {
        let mut reporter = ProgressReporter::new()
            .with_suspend(self.suspend.clone())
            .with_terminal_bar(self.opts.progress, self.opts.progress_label.clone());
        if let Some(cb) = self.on_progress.clone() {
            reporter = reporter.with_callback(move |frac| cb(frac));
        }
        reporter
    }

    fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            batch_size: self.opts.batch_size,
            read_timeout: self.opts.read_timeout,
            open_retries: self.opts.open_retries,
        }
    }

    /// Run the pipeline and return the unified table.
    pub fn run(&self) -> Result<RecordBatch> {
        self.run_with_report().map(|(table, _)| table)
    }

    /// Run the pipeline, returning the unified table and a run summary.
    ///
    /// Date bounds are validated before storage is touched. Any error, or
    /// cancellation, discards everything read so far.
    pub fn run_with_report(&self) -> Result<(RecordBatch, ExtractReport)> {
        init_tracing_once();
        let opts = &self.opts;
        validate_range(&opts.start, &opts.end)?;

        if let Some(n) = opts.parallelism {
            if n > 0 {
                rayon::ThreadPoolBuilder::new().num_threads(n).build_global().ok();
            }
        }

        let folders = resolve_folders_with(&opts.base_dir, &opts.start, &opts.end, opts.year_folders)?;
        let files = plan_files(&folders, &opts.extension)?;
        if files.is_empty() {
            tracing::warn!(
                "No .{} files in {} between {} and {}.",
                opts.extension,
                opts.base_dir.display(),
                opts.start,
                opts.end
            );
        } else {
            tracing::info!("Planned {} files across {} folders.", files.len(), folders.len());
        }

        let reporter = self.reporter();
        reporter.begin(files.len());
        let scan_opts = self.scan_options();
        let skipped = AtomicUsize::new(0);
        let concurrent = opts.file_concurrency > 1;

        let per_file = map_files_ordered(
            &files,
            opts.file_concurrency,
            || {
                self.cancel.check()?;
                if concurrent {
                    throttle_low_memory(opts.low_memory_threshold);
                }
                Ok(())
            },
            |job| {
                self.cancel.check()?;
                let res = scan_file(&job.path, &opts.columns, &scan_opts);
                reporter.tick();
                match res {
                    Ok(table) => Ok(Some(table)),
                    Err(e) if e.is_per_file() && opts.on_error == ErrorPolicy::Skip => {
                        tracing::warn!("skipping {}: {e}", job.path.display());
                        skipped.fetch_add(1, Ordering::Relaxed);
                        Ok(None)
                    }
                    Err(e) => Err(e),
                }
            },
        )
        .inspect_err(|e| {
            tracing::error!("extraction aborted: {e}");
            reporter.finish("aborted");
        })?;

        let tables: Vec<RecordBatch> = per_file.into_iter().flatten().collect();
        let table = merge_tables(&tables, &opts.columns)?;
        reporter.finish("done");

        let files_skipped = skipped.into_inner();
        let report = ExtractReport {
            folders: folders.into_iter().map(|f| f.name).collect(),
            files_total: files.len(),
            files_read: files.len() - files_skipped,
            files_skipped,
            rows: table.num_rows(),
            columns: table.schema().fields().iter().map(|f| f.name().clone()).collect(),
        };
        tracing::info!(
            "Extracted {} rows x {} columns from {} files ({} skipped).",
            report.rows,
            report.columns.len(),
            report.files_read,
            report.files_skipped
        );
        Ok((table, report))
    }

    /// Run the pipeline and write the result to `out_path` as `;`-separated ISO-8859-1 text.
    ///
    /// When the export itself fails the error is [`ExtractError::Export`],
    /// which still holds the extracted table.
    pub fn extract_to_csv(&self, out_path: &Path) -> Result<ExtractReport> {
        let (table, report) = self.run_with_report()?;
        match export_csv(&table, out_path) {
            Ok(()) => Ok(report),
            Err(e) => Err(ExtractError::Export {
                path: out_path.to_path_buf(),
                table: Box::new(table),
                source: Box::new(e),
            }),
        }
    }
}
