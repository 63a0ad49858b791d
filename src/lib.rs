mod config;
mod date;
mod error;
mod paths;

mod scan;
mod dedupe;
mod aggregate;
mod export;

mod progress;
mod concurrency;
mod util;
mod mem;
mod pipeline;

mod catalog;

pub use crate::config::{ErrorPolicy, ExtractOptions, YearFolderPolicy};
pub use crate::date::{PartitionValue, YearMonth};
pub use crate::error::{ExtractError, FileReadSource, Result};
pub use crate::pipeline::{ExtractReport, Extractor};

// Individual pipeline stages, usable on their own.
pub use crate::paths::{in_range, list_data_files, plan_files, resolve_folders, resolve_folders_with, validate_range, FileJob, PartitionFolder};
pub use crate::scan::{read_schema, project_columns, read_projected, scan_file, scan_folder, ScanOptions};
pub use crate::dedupe::dedupe_batch;
pub use crate::aggregate::{empty_table, merge_tables};
pub use crate::export::{encode_latin1, export_csv, export_to_writer, FIELD_SEPARATOR};

// Expose progress, suspension, and cancellation hooks.
pub use crate::progress::{make_count_progress, ProgressReporter, Suspend, ThreadYield};
pub use crate::concurrency::{map_files_ordered, CancelToken};

// Expose memory helpers for adaptive throttling from the binary.
pub use crate::mem::{available_memory_fraction, is_low_memory};

pub use crate::util::init_tracing_once;

// Column catalog and its pure filters.
pub use crate::catalog::{normalize_label, visible, CatalogFilter, ColumnCatalog};
