use anyhow::{bail, Context, Result};
use clap::Parser;
use pqx::{ColumnCatalog, Extractor, YearFolderPolicy};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Extract selected columns from year-month partitioned Parquet folders into
/// one `;`-separated ISO-8859-1 CSV.
#[derive(Debug, Parser)]
#[command(name = "pqx", version, about)]
struct Cli {
    /// Directory holding the YYYY-MM partition folders
    #[arg(long)]
    base_dir: PathBuf,

    /// First month to extract (YYYY-MM, inclusive)
    #[arg(long)]
    start: String,

    /// Last month to extract (YYYY-MM, inclusive)
    #[arg(long)]
    end: String,

    /// Comma-separated column names, in output order
    #[arg(long, value_delimiter = ',')]
    columns: Vec<String>,

    /// Text file with ;-separated column names to add to the selection
    #[arg(long)]
    columns_file: Option<PathBuf>,

    /// Catalog of known columns; names from --columns-file are matched against it
    /// accent- and case-insensitively
    #[arg(long, requires = "columns_file")]
    catalog: Option<PathBuf>,

    /// Output CSV path
    #[arg(long, short)]
    out: PathBuf,

    /// Number of files read concurrently
    #[arg(long, default_value_t = 1)]
    concurrency: usize,

    /// Worker threads for concurrent reads (defaults to available cores)
    #[arg(long)]
    threads: Option<usize>,

    /// Skip unreadable files instead of aborting
    #[arg(long)]
    skip_errors: bool,

    /// Per-file read timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Attempts for transient open failures on network shares
    #[arg(long, default_value_t = 1)]
    open_retries: usize,

    /// Treat YYYY folders as covering all twelve months
    #[arg(long)]
    whole_year_folders: bool,

    /// Disable the progress bar
    #[arg(long)]
    no_progress: bool,

    /// Write a JSON run summary here
    #[arg(long)]
    report: Option<PathBuf>,
}

fn selected_columns(cli: &Cli) -> Result<Vec<String>> {
    let mut columns = cli.columns.iter().map(|c| c.trim().to_string()).filter(|c| !c.is_empty()).collect::<Vec<_>>();
    if let Some(path) = &cli.columns_file {
        let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        match &cli.catalog {
            Some(cat) => {
                let catalog = ColumnCatalog::load(cat)?;
                columns.extend(catalog.select_from_text(&text));
            }
            None => columns.extend(ColumnCatalog::parse(&text).items().iter().cloned()),
        }
    }
    if columns.is_empty() {
        bail!("no columns selected: pass --columns and/or --columns-file");
    }
    Ok(columns)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let columns = selected_columns(&cli)?;

    let mut etl = Extractor::new()
        .base_dir(&cli.base_dir)
        .date_range(&cli.start, &cli.end)
        .columns(columns)
        .file_concurrency(cli.concurrency)
        .skip_unreadable(cli.skip_errors)
        .read_timeout(cli.timeout_secs.map(Duration::from_secs))
        .open_retries(cli.open_retries)
        .progress(!cli.no_progress)
        .progress_label("Extracting");
    if let Some(n) = cli.threads {
        etl = etl.parallelism(n);
    }
    if cli.whole_year_folders {
        etl = etl.year_folders(YearFolderPolicy::WholeYear);
    }

    let report = etl
        .extract_to_csv(&cli.out)
        .with_context(|| format!("extract to {}", cli.out.display()))?;

    if let Some(path) = &cli.report {
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    }
    println!("Wrote {} rows x {} columns to {}", report.rows, report.columns.len(), cli.out.display());
    Ok(())
}
