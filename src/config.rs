use std::path::{Path, PathBuf};
use std::time::Duration;

/// What to do when a single data file cannot be read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Abort the whole run on the first unreadable file.
    #[default]
    FailFast,
    /// Log the failure, count the file as skipped, and continue.
    Skip,
}

/// How to treat partition folders named with a year only (`YYYY`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum YearFolderPolicy {
    /// Ignore them with a warning; only `YYYY-MM` folders are extracted.
    #[default]
    Skip,
    /// Treat `YYYY` as all twelve months: included when any month of that year
    /// lies inside the requested range.
    WholeYear,
}

/// User-facing options with sensible defaults and builder chaining.
#[derive(Clone, Debug)]
pub struct ExtractOptions {
    pub base_dir: PathBuf,
    pub start: String,                // raw "YYYY-MM", validated before any I/O
    pub end: String,                  // inclusive
    pub columns: Vec<String>,         // ordered, first occurrence wins
    pub extension: String,            // without dot, matched case-insensitively
    pub on_error: ErrorPolicy,
    pub year_folders: YearFolderPolicy,
    pub parallelism: Option<usize>,   // Some(N) to set rayon threads, None to use default
    pub file_concurrency: usize,      // files read concurrently; 1 = sequential
    pub read_timeout: Option<Duration>,
    pub open_retries: usize,          // attempts for transient open failures
    pub batch_size: usize,            // Parquet reader batch size
    pub progress: bool,               // show progress bar
    pub progress_label: Option<String>,
    pub low_memory_threshold: f64,    // available/total below this pauses dispatch
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            start: String::new(),
            end: String::new(),
            columns: Vec::new(),
            extension: "parquet".to_string(),
            on_error: ErrorPolicy::FailFast,
            year_folders: YearFolderPolicy::Skip,
            parallelism: None,
            file_concurrency: 1,
            read_timeout: None,
            open_retries: 1,
            batch_size: 8192,
            progress: false,
            progress_label: None,
            low_memory_threshold: 0.10,
        }
    }
}

impl ExtractOptions {
    pub fn with_base_dir(mut self, base_dir: impl AsRef<Path>) -> Self {
        self.base_dir = base_dir.as_ref().to_path_buf();
        self
    }
    pub fn with_date_range(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start = start.into();
        self.end = end.into();
        self
    }
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for c in columns {
            let c = c.into();
            if !out.contains(&c) {
                out.push(c);
            }
        }
        self.columns = out;
        self
    }
    pub fn with_extension(mut self, ext: impl AsRef<str>) -> Self {
        self.extension = ext.as_ref().trim_start_matches('.').to_ascii_lowercase();
        self
    }
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.on_error = policy;
        self
    }
    pub fn with_year_folders(mut self, policy: YearFolderPolicy) -> Self {
        self.year_folders = policy;
        self
    }
    pub fn with_parallelism(mut self, threads: usize) -> Self {
        self.parallelism = Some(threads);
        self
    }
    pub fn with_file_concurrency(mut self, n: usize) -> Self {
        self.file_concurrency = n.max(1);
        self
    }
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }
    pub fn with_open_retries(mut self, tries: usize) -> Self {
        self.open_retries = tries.max(1);
        self
    }
    pub fn with_batch_size(mut self, rows: usize) -> Self {
        self.batch_size = rows.max(1);
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }
    pub fn with_progress_label(mut self, label: impl Into<String>) -> Self {
        self.progress_label = Some(label.into());
        self
    }
    pub fn with_low_memory_threshold(mut self, frac: f64) -> Self {
        self.low_memory_threshold = frac.clamp(0.0, 1.0);
        self
    }
}
