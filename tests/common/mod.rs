#![allow(dead_code)]

use arrow::array::{Array, ArrayRef, Float64Array, Int32Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Build a batch of nullable Int64 columns, e.g. `ints(&[("A", vec![Some(1)])])`.
pub fn ints(cols: &[(&str, Vec<Option<i64>>)]) -> RecordBatch {
    let fields: Vec<Field> = cols.iter().map(|(n, _)| Field::new(*n, DataType::Int64, true)).collect();
    let arrays: Vec<ArrayRef> = cols.iter().map(|(_, v)| Arc::new(Int64Array::from(v.clone())) as ArrayRef).collect();
    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).unwrap()
}

/// Build a batch of nullable Utf8 columns.
pub fn strs(cols: &[(&str, Vec<Option<&str>>)]) -> RecordBatch {
    let fields: Vec<Field> = cols.iter().map(|(n, _)| Field::new(*n, DataType::Utf8, true)).collect();
    let arrays: Vec<ArrayRef> = cols.iter().map(|(_, v)| Arc::new(StringArray::from(v.clone())) as ArrayRef).collect();
    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).unwrap()
}

/// Single nullable Float64 column.
pub fn floats(name: &str, values: Vec<Option<f64>>) -> RecordBatch {
    let schema = Schema::new(vec![Field::new(name, DataType::Float64, true)]);
    RecordBatch::try_new(Arc::new(schema), vec![Arc::new(Float64Array::from(values)) as ArrayRef]).unwrap()
}

/// Single nullable Int32 column.
pub fn int32s(name: &str, values: Vec<Option<i32>>) -> RecordBatch {
    let schema = Schema::new(vec![Field::new(name, DataType::Int32, true)]);
    RecordBatch::try_new(Arc::new(schema), vec![Arc::new(Int32Array::from(values)) as ArrayRef]).unwrap()
}

/// Write `batch` as a Parquet file at `path`, creating parent folders.
pub fn write_parquet(path: &Path, batch: &RecordBatch) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let f = File::create(path).unwrap();
    let mut w = ArrowWriter::try_new(f, batch.schema(), None).unwrap();
    w.write(batch).unwrap();
    w.close().unwrap();
}

/// A file with the right extension whose contents are not Parquet.
pub fn write_corrupt(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut f = File::create(path).unwrap();
    writeln!(&mut f, "A;B\n1;2").unwrap();
}

/// A named pipe with no writer: opening it for reading blocks indefinitely.
#[cfg(unix)]
pub fn make_fifo(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let status = std::process::Command::new("mkfifo").arg(path).status().unwrap();
    assert!(status.success(), "mkfifo {}", path.display());
}

pub fn names(batch: &RecordBatch) -> Vec<String> {
    batch.schema().fields().iter().map(|f| f.name().clone()).collect()
}

pub fn i64_col(batch: &RecordBatch, name: &str) -> Vec<Option<i64>> {
    let col = batch.column_by_name(name).unwrap();
    let arr = col.as_any().downcast_ref::<Int64Array>().unwrap();
    (0..arr.len()).map(|i| (!arr.is_null(i)).then(|| arr.value(i))).collect()
}

pub fn f64_col(batch: &RecordBatch, name: &str) -> Vec<Option<f64>> {
    let col = batch.column_by_name(name).unwrap();
    let arr = col.as_any().downcast_ref::<Float64Array>().unwrap();
    (0..arr.len()).map(|i| (!arr.is_null(i)).then(|| arr.value(i))).collect()
}

pub fn str_col(batch: &RecordBatch, name: &str) -> Vec<Option<String>> {
    let col = batch.column_by_name(name).unwrap();
    let arr = col.as_any().downcast_ref::<StringArray>().unwrap();
    (0..arr.len()).map(|i| (!arr.is_null(i)).then(|| arr.value(i).to_string())).collect()
}

pub fn cols(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Partition tree used by several tests:
/// - `2023-01/a.parquet`: A,B  rows (1,10) (1,10) (2,20)  (one exact duplicate)
/// - `2023-01/b.parquet`: B,C  rows (30,300)
/// - `2023-02/a.parquet`: A,B  rows (1,10)                (same row as in 2023-01/a)
/// - `2023-05/a.parquet`: A    rows (99)                  (outside Jan..Feb)
/// - `other/x.parquet`:   A    rows (77)                  (not a partition name)
/// - `2023-01/notes.txt`: ignored by extension
pub fn make_tree() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path();

    write_parquet(
        &base.join("2023-01").join("a.parquet"),
        &ints(&[("A", vec![Some(1), Some(1), Some(2)]), ("B", vec![Some(10), Some(10), Some(20)])]),
    );
    write_parquet(
        &base.join("2023-01").join("b.parquet"),
        &ints(&[("B", vec![Some(30)]), ("C", vec![Some(300)])]),
    );
    write_parquet(
        &base.join("2023-02").join("a.parquet"),
        &ints(&[("A", vec![Some(1)]), ("B", vec![Some(10)])]),
    );
    write_parquet(&base.join("2023-05").join("a.parquet"), &ints(&[("A", vec![Some(99)])]));
    write_parquet(&base.join("other").join("x.parquet"), &ints(&[("A", vec![Some(77)])]));
    fs::write(base.join("2023-01").join("notes.txt"), "not data").unwrap();

    dir
}
