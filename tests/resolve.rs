#[path = "common/mod.rs"]
mod common;

use common::*;
use pqx::{resolve_folders, resolve_folders_with, validate_range, ExtractError, PartitionValue, YearFolderPolicy, YearMonth};
use std::fs;
use std::path::Path;

/// Folders {2023-01, 2023-02, 2023-05, other} with range Jan..Feb 2023:
/// only the two months inside the range come back, in calendar order.
#[test]
fn resolves_months_inside_range() {
    let tree = make_tree();
    let got = resolve_folders(tree.path(), "2023-01", "2023-02").unwrap();
    assert_eq!(got, vec!["2023-01".to_string(), "2023-02".to_string()]);
}

/// Bounds are inclusive on both ends, and a single-month range works.
#[test]
fn range_bounds_are_inclusive() {
    let tree = make_tree();
    assert_eq!(resolve_folders(tree.path(), "2023-05", "2023-05").unwrap(), vec!["2023-05".to_string()]);
    assert_eq!(
        resolve_folders(tree.path(), "2022-12", "2023-12").unwrap(),
        vec!["2023-01".to_string(), "2023-02".to_string(), "2023-05".to_string()]
    );
}

/// Malformed bounds fail with InvalidDateFormat before the (missing) base
/// directory is ever looked at.
#[test]
fn rejects_malformed_dates_before_io() {
    let missing = Path::new("/definitely/not/here");
    for bad in ["2023-1", "2023-13", "2023-00", "23-01", "2023/01", "2023-01-01", ""] {
        let err = resolve_folders(missing, bad, "2023-02").unwrap_err();
        assert!(matches!(err, ExtractError::InvalidDateFormat { .. }), "{bad:?} gave {err}");
    }
    let err = resolve_folders(missing, "2023-01", "2023-1").unwrap_err();
    assert!(matches!(err, ExtractError::InvalidDateFormat { .. }));
}

/// End before start is InvalidDateRange, again without touching storage.
#[test]
fn rejects_inverted_range_before_io() {
    let err = resolve_folders(Path::new("/definitely/not/here"), "2023-03", "2023-02").unwrap_err();
    assert!(matches!(err, ExtractError::InvalidDateRange { .. }));
    assert!(validate_range("2023-02", "2023-02").is_ok());
}

/// A missing base directory is reported as DirectoryNotFound.
#[test]
fn missing_base_dir_is_directory_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = resolve_folders(&dir.path().join("nope"), "2023-01", "2023-02").unwrap_err();
    assert!(matches!(err, ExtractError::DirectoryNotFound { .. }));
}

/// Year-only folders are skipped by default. With the whole-year policy a
/// `2023` folder joins any range touching 2023 and sorts before 2023-01.
#[test]
fn year_only_folders_follow_policy() {
    let tree = make_tree();
    fs::create_dir_all(tree.path().join("2023")).unwrap();
    fs::create_dir_all(tree.path().join("2021")).unwrap();

    let skip = resolve_folders_with(tree.path(), "2023-01", "2023-02", YearFolderPolicy::Skip).unwrap();
    assert!(skip.iter().all(|f| f.name != "2023"));

    let whole = resolve_folders_with(tree.path(), "2023-01", "2023-02", YearFolderPolicy::WholeYear).unwrap();
    let names: Vec<&str> = whole.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["2023", "2023-01", "2023-02"]);

    let late = resolve_folders_with(tree.path(), "2023-11", "2024-02", YearFolderPolicy::WholeYear).unwrap();
    let names: Vec<&str> = late.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["2023"]);
}

/// Names that match the pattern shape but not the calendar, and plain files
/// named like partitions, are ignored.
#[test]
fn ignores_impossible_months_and_plain_files() {
    let tree = make_tree();
    fs::create_dir_all(tree.path().join("2023-13")).unwrap();
    fs::write(tree.path().join("2023-02-extra"), "x").unwrap();
    let got = resolve_folders(tree.path(), "2023-01", "2023-12").unwrap();
    assert_eq!(got, vec!["2023-01".to_string(), "2023-02".to_string(), "2023-05".to_string()]);
}

/// Partition values parse strictly and order year-only before that year's months.
#[test]
fn partition_values_parse_and_order() {
    assert_eq!(PartitionValue::parse("2023-04"), Some(PartitionValue::Month(YearMonth::new(2023, 4))));
    assert_eq!(PartitionValue::parse("2023"), Some(PartitionValue::Year(2023)));
    assert_eq!(PartitionValue::parse("2023-4"), None);
    assert_eq!(PartitionValue::parse("x2023"), None);
    assert!(PartitionValue::Year(2023) < PartitionValue::Month(YearMonth::new(2023, 1)));
    assert!(PartitionValue::Month(YearMonth::new(2022, 12)) < PartitionValue::Year(2023));
    assert_eq!("2024-07".parse::<YearMonth>().unwrap().to_string(), "2024-07");
}
