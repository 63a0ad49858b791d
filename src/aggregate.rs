//! Union-with-null-fill merge of per-file results.

use crate::error::Result;
use arrow::array::{new_null_array, Array, ArrayRef, StringArray};
use arrow::compute::{can_cast_types, cast_with_options, concat_batches, CastOptions};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use std::sync::Arc;

/// Zero-row table whose columns are `columns` (all nullable text), used when
/// nothing matched so downstream export still has headers.
pub fn empty_table(columns: &[String]) -> RecordBatch {
    let fields: Vec<Field> = columns.iter().map(|c| Field::new(c, DataType::Utf8, true)).collect();
    RecordBatch::new_empty(Arc::new(Schema::new(fields)))
}

/// Column set of the merged table: every column of every table, first-seen
/// order, always nullable, typed so that every table's values fit unchanged.
fn union_schema(tables: &[&RecordBatch]) -> SchemaRef {
    let mut fields: Vec<(String, DataType)> = Vec::new();
    for t in tables {
        for f in t.schema().fields() {
            match fields.iter_mut().find(|(name, _)| name == f.name()) {
                Some((_, ty)) => *ty = common_type(ty, f.data_type()),
                None => fields.push((f.name().clone(), f.data_type().clone())),
            }
        }
    }
    let fields: Vec<Field> = fields.into_iter().map(|(name, ty)| Field::new(name, ty, true)).collect();
    Arc::new(Schema::new(fields))
}

fn int_width(ty: &DataType) -> usize {
    ty.primitive_width().unwrap_or(8)
}

/// Smallest type both `a` and `b` widen into without losing values:
/// integers to the widest integer, integer with float to `Float64`,
/// anything else to text.
fn common_type(a: &DataType, b: &DataType) -> DataType {
    use DataType::*;
    match (a, b) {
        _ if a == b => a.clone(),
        (Null, other) | (other, Null) => other.clone(),
        _ if (a.is_signed_integer() && b.is_signed_integer()) || (a.is_unsigned_integer() && b.is_unsigned_integer()) => {
            if int_width(a) >= int_width(b) { a.clone() } else { b.clone() }
        }
        _ if a.is_integer() && b.is_integer() => {
            let (signed, unsigned) = if a.is_signed_integer() { (a, b) } else { (b, a) };
            if int_width(unsigned) < int_width(signed) {
                signed.clone()
            } else if int_width(unsigned) < 8 {
                Int64
            } else {
                // u64 and i64 together only fit a 20-digit decimal.
                Decimal128(20, 0)
            }
        }
        _ if (a.is_integer() || a.is_floating()) && (b.is_integer() || b.is_floating()) => Float64,
        _ => Utf8,
    }
}

fn conform(column: &ArrayRef, target: &Field) -> Result<ArrayRef> {
    if column.data_type() == target.data_type() {
        return Ok(column.clone());
    }
    if target.data_type() == &DataType::Utf8 && !can_cast_types(column.data_type(), &DataType::Utf8) {
        return display_text(column);
    }
    let opts = CastOptions { safe: false, ..Default::default() };
    Ok(cast_with_options(column, target.data_type(), &opts)?)
}

/// Render a column the cast kernels cannot turn into text (nested types) with
/// its display form; nulls stay null.
fn display_text(column: &ArrayRef) -> Result<ArrayRef> {
    let fmt = ArrayFormatter::try_new(column.as_ref(), &FormatOptions::default())?;
    let text: StringArray = (0..column.len())
        .map(|i| (!column.is_null(i)).then(|| fmt.value(i).to_string()))
        .collect();
    Ok(Arc::new(text))
}

/// Re-shape `table` onto `schema`, filling absent columns with nulls.
fn align(table: &RecordBatch, schema: &SchemaRef) -> Result<RecordBatch> {
    let rows = table.num_rows();
    let columns = schema
        .fields()
        .iter()
        .map(|field| match table.column_by_name(field.name()) {
            Some(col) => conform(col, field),
            None => Ok(new_null_array(field.data_type(), rows)),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(RecordBatch::try_new(schema.clone(), columns)?)
}

/// Concatenate per-file tables in sequence order under the union of their columns.
///
/// Tables without any column (files holding none of the requested columns)
/// contribute nothing. With nothing left, the result is [`empty_table`] over
/// `fallback_columns`. Rows are never reordered or deduplicated across tables.
pub fn merge_tables(tables: &[RecordBatch], fallback_columns: &[String]) -> Result<RecordBatch> {
    let parts: Vec<&RecordBatch> = tables.iter().filter(|t| t.num_columns() > 0).collect();
    if parts.is_empty() {
        return Ok(empty_table(fallback_columns));
    }

    let schema = union_schema(&parts);
    let aligned = parts
        .iter()
        .map(|t| align(t, &schema))
        .collect::<Result<Vec<_>>>()?;
    Ok(concat_batches(&schema, &aligned)?)
}
