//! Delimited-text export: `;` separator, ISO-8859-1 bytes, header row, no index column.

use crate::error::{ExtractError, Result};
use crate::util::{remove_if_exists, replace_file};
use arrow::record_batch::RecordBatch;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub const FIELD_SEPARATOR: u8 = b';';

/// Encode `text` as ISO-8859-1, appending to `out`. Returns the first
/// character outside U+0000..=U+00FF, leaving `out` partially filled.
pub fn encode_latin1(text: &str, out: &mut Vec<u8>) -> std::result::Result<(), char> {
    for ch in text.chars() {
        let cp = ch as u32;
        if cp > 0xFF {
            return Err(ch);
        }
        out.push(cp as u8);
    }
    Ok(())
}

fn encode_field(text: &str, row: usize, column: &str) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(text.len());
    encode_latin1(text, &mut buf).map_err(|ch| ExtractError::Encoding { row, column: column.to_string(), ch })?;
    Ok(buf)
}

/// Write `table` to `writer`. Row numbers in encoding errors are 1-based data
/// rows; 0 is the header.
pub fn export_to_writer<W: Write>(table: &RecordBatch, writer: W) -> Result<()> {
    let schema = table.schema();
    let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
    if names.is_empty() {
        return Ok(());
    }

    let mut w = csv::WriterBuilder::new()
        .delimiter(FIELD_SEPARATOR)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    let header = names
        .iter()
        .map(|name| encode_field(name, 0, name))
        .collect::<Result<Vec<_>>>()?;
    w.write_record(&header)?;

    let opts = FormatOptions::default().with_null("");
    let formatters = table
        .columns()
        .iter()
        .map(|c| ArrayFormatter::try_new(c.as_ref(), &opts))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut text = String::new();
    let mut record: Vec<Vec<u8>> = Vec::with_capacity(names.len());
    for row in 0..table.num_rows() {
        record.clear();
        for (fmt, name) in formatters.iter().zip(&names) {
            text.clear();
            fmt.value(row).write(&mut text)?;
            record.push(encode_field(&text, row + 1, name)?);
        }
        w.write_record(&record)?;
    }
    w.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write `table` to `dest`. Output goes to a sibling temporary file first, so
/// a failed export leaves no partial file behind.
pub fn export_csv(table: &RecordBatch, dest: &Path) -> Result<()> {
    let tmp = dest.with_extension("csv.inprogress");
    let file = File::create(&tmp).map_err(|e| ExtractError::from_io(&tmp, e))?;
    let res = export_to_writer(table, BufWriter::new(file));
    if let Err(e) = res {
        let _ = remove_if_exists(&tmp);
        return Err(e);
    }
    replace_file(&tmp, dest).map_err(|e| ExtractError::from_io(dest, e))?;
    tracing::info!("wrote {} rows to {}", table.num_rows(), dest.display());
    Ok(())
}
