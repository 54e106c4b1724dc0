use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::normalization::OutputRow;

/// Written first so spreadsheet tools read the file as UTF-8 (Vietnamese product names).
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Header plus one record per row into any writer. No BOM.
pub fn write_rows<W: Write>(writer: W, rows: &[OutputRow]) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(OutputRow::HEADERS)?;
    for row in rows {
        wtr.write_record(row.record())?;
    }
    wtr.flush()?;
    Ok(rows.len())
}

/// Create (or truncate) `path` and write the export, BOM first.
pub fn write_csv(path: &Path, rows: &[OutputRow]) -> Result<usize> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);
    out.write_all(UTF8_BOM)?;
    let n = write_rows(&mut out, rows).with_context(|| format!("writing {}", path.display()))?;
    out.flush()?;
    info!(path = %path.display(), rows = n, "csv written");
    Ok(n)
}
