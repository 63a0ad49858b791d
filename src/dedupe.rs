//! Exact-duplicate row removal within one table.
//!
//! Rows are encoded with Arrow's row format so every column type compares by
//! value (nulls equal nulls, as with any other repeated value). Types the row
//! format cannot encode fall back to their display text.

use crate::error::Result;
use ahash::AHashSet;
use arrow::array::{Array, ArrayRef, UInt32Array};
use arrow::compute::take_record_batch;
use arrow::record_batch::RecordBatch;
use arrow::row::{RowConverter, SortField};
use arrow::util::display::{ArrayFormatter, FormatOptions};

/// Keep the first occurrence of every distinct row, preserving order.
pub fn dedupe_batch(batch: &RecordBatch) -> Result<RecordBatch> {
    if batch.num_columns() == 0 || batch.num_rows() <= 1 {
        return Ok(batch.clone());
    }

    let keep = first_occurrences(batch.columns())?;
    if keep.len() == batch.num_rows() {
        return Ok(batch.clone());
    }
    let indices = UInt32Array::from(keep);
    Ok(take_record_batch(batch, &indices)?)
}

fn first_occurrences(columns: &[ArrayRef]) -> Result<Vec<u32>> {
    let fields: Vec<SortField> = columns.iter().map(|c| SortField::new(c.data_type().clone())).collect();
    let num_rows = columns[0].len();

    if RowConverter::supports_fields(&fields) {
        let converter = RowConverter::new(fields)?;
        let rows = converter.convert_columns(columns)?;
        let mut seen = AHashSet::with_capacity(num_rows);
        let mut keep = Vec::with_capacity(num_rows);
        for (i, row) in rows.iter().enumerate() {
            if seen.insert(row) {
                keep.push(i as u32);
            }
        }
        return Ok(keep);
    }

    let opts = FormatOptions::default();
    let formatters = columns
        .iter()
        .map(|c| ArrayFormatter::try_new(c.as_ref(), &opts))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let mut seen: AHashSet<Vec<Option<String>>> = AHashSet::with_capacity(num_rows);
    let mut keep = Vec::with_capacity(num_rows);
    for i in 0..num_rows {
        let key: Vec<Option<String>> = columns
            .iter()
            .zip(&formatters)
            .map(|(col, fmt)| (!col.is_null(i)).then(|| fmt.value(i).to_string()))
            .collect();
        if seen.insert(key) {
            keep.push(i as u32);
        }
    }
    Ok(keep)
}
