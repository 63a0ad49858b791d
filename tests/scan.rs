#[path = "common/mod.rs"]
mod common;

use common::*;
use pqx::{
    dedupe_batch, list_data_files, read_schema, project_columns, read_projected, scan_file, scan_folder,
    ExtractError, ProgressReporter, ScanOptions,
};
use std::time::Duration;

/// The footer read returns the column names of the file without reading rows.
#[test]
fn footer_reports_file_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("f.parquet");
    write_parquet(&path, &ints(&[("A", vec![Some(1)]), ("B", vec![Some(2)]), ("C", vec![Some(3)])]));

    let schema = read_schema(&path, 1).unwrap();
    let got: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
    assert_eq!(got, vec!["A", "B", "C"]);
    assert_eq!(project_columns(&cols(&["C", "Z", "A"]), &schema), cols(&["C", "A"]));
}

/// Projection keeps desired order (C before A even though the file stores A
/// first), drops names the file lacks, and never returns unrequested columns.
#[test]
fn reads_only_requested_columns_in_desired_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("f.parquet");
    write_parquet(
        &path,
        &ints(&[("A", vec![Some(1), Some(2)]), ("B", vec![Some(10), Some(20)]), ("C", vec![Some(100), Some(200)])]),
    );

    let got = read_projected(&path, &cols(&["C", "missing", "A"]), &ScanOptions::default()).unwrap();
    assert_eq!(names(&got), cols(&["C", "A"]));
    assert_eq!(i64_col(&got, "C"), vec![Some(100), Some(200)]);
    assert_eq!(i64_col(&got, "A"), vec![Some(1), Some(2)]);
}

/// A file holding none of the requested columns yields no columns and no rows.
#[test]
fn file_without_requested_columns_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("f.parquet");
    write_parquet(&path, &ints(&[("A", vec![Some(1)])]));

    let got = scan_file(&path, &cols(&["X", "Y"]), &ScanOptions::default()).unwrap();
    assert_eq!(got.num_columns(), 0);
    assert_eq!(got.num_rows(), 0);
}

/// Rows (1,2),(1,2),(3,4) collapse to (1,2),(3,4), first occurrence first.
#[test]
fn scan_file_drops_exact_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("f.parquet");
    write_parquet(
        &path,
        &ints(&[("x", vec![Some(1), Some(1), Some(3)]), ("y", vec![Some(2), Some(2), Some(4)])]),
    );

    let got = scan_file(&path, &cols(&["x", "y"]), &ScanOptions::default()).unwrap();
    assert_eq!(i64_col(&got, "x"), vec![Some(1), Some(3)]);
    assert_eq!(i64_col(&got, "y"), vec![Some(2), Some(4)]);
}

/// Duplicates are judged on the projected columns only: rows differing in an
/// unrequested column are duplicates once that column is projected away.
#[test]
fn dedupe_applies_to_projected_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("f.parquet");
    write_parquet(&path, &ints(&[("k", vec![Some(1), Some(1)]), ("v", vec![Some(5), Some(6)])]));

    let got = scan_file(&path, &cols(&["k"]), &ScanOptions::default()).unwrap();
    assert_eq!(i64_col(&got, "k"), vec![Some(1)]);
}

/// Nulls compare equal to nulls; order of kept rows is preserved.
#[test]
fn dedupe_treats_nulls_as_values() {
    let batch = strs(&[
        ("a", vec![None, Some("x"), None, Some("x"), Some("y")]),
        ("b", vec![Some("1"), None, Some("1"), None, None]),
    ]);
    let got = dedupe_batch(&batch).unwrap();
    assert_eq!(str_col(&got, "a"), vec![None, Some("x".into()), Some("y".into())]);
    assert_eq!(str_col(&got, "b"), vec![Some("1".into()), None, None]);
}

/// A file that is not Parquet fails with FileRead naming the file.
#[test]
fn corrupt_file_is_file_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.parquet");
    write_corrupt(&path);

    let err = scan_file(&path, &cols(&["A"]), &ScanOptions::default()).unwrap_err();
    match err {
        ExtractError::FileRead { path: p, .. } => assert_eq!(p, path),
        other => panic!("expected FileRead, got {other}"),
    }
}

/// The timed read path returns the same data when the file is readable.
#[test]
fn timed_read_returns_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("f.parquet");
    write_parquet(&path, &ints(&[("A", vec![Some(7)])]));

    let opts = ScanOptions { read_timeout: Some(Duration::from_secs(30)), ..ScanOptions::default() };
    let got = scan_file(&path, &cols(&["A"]), &opts).unwrap();
    assert_eq!(i64_col(&got, "A"), vec![Some(7)]);
}

/// A file whose open never returns is abandoned once the read timeout expires.
#[cfg(unix)]
#[test]
fn stalled_read_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("x.parquet");
    make_fifo(&path);
    assert_eq!(list_data_files(dir.path(), "parquet").unwrap(), vec![path.clone()]);

    let opts = ScanOptions { read_timeout: Some(Duration::from_millis(50)), ..ScanOptions::default() };
    let err = scan_file(&path, &cols(&["A"]), &opts).unwrap_err();
    match err {
        ExtractError::ReadTimeout { path: p, timeout } => {
            assert_eq!(p, path);
            assert_eq!(timeout, Duration::from_millis(50));
        }
        other => panic!("expected ReadTimeout, got {other}"),
    }
    assert!(ExtractError::ReadTimeout { path, timeout: Duration::ZERO }.is_per_file());
}

/// Folder scan lists only `.parquet` files, in file-name order, ticking once
/// per file.
#[test]
fn scan_folder_orders_by_file_name() {
    let dir = tempfile::tempdir().unwrap();
    write_parquet(&dir.path().join("b.parquet"), &ints(&[("A", vec![Some(2)])]));
    write_parquet(&dir.path().join("a.parquet"), &ints(&[("A", vec![Some(1)])]));
    write_parquet(&dir.path().join("c.PARQUET"), &ints(&[("A", vec![Some(3)])]));
    std::fs::write(dir.path().join("readme.md"), "x").unwrap();

    let files = list_data_files(dir.path(), "parquet").unwrap();
    assert_eq!(files.len(), 3);

    let progress = ProgressReporter::new();
    progress.begin(files.len());
    let tables = scan_folder(dir.path(), &cols(&["A"]), "parquet", &ScanOptions::default(), &progress).unwrap();
    let firsts: Vec<Option<i64>> = tables.iter().map(|t| i64_col(t, "A")[0]).collect();
    assert_eq!(firsts, vec![Some(1), Some(2), Some(3)]);
    assert_eq!(progress.processed(), 3);
    assert_eq!(progress.fraction(), 1.0);
}
