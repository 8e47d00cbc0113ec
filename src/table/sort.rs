//! Sort/finalize step
//!
//! Produces the final table sorted by reference chromosome (lexicographic)
//! then reference start (numeric). The sorted table is written to a `.tmp`
//! sibling and renamed over the original path, so the replace is atomic and
//! no temporary file survives success.

use crate::core::{SortResult, TableSortError};
use memchr::memchr;
use std::ffi::OsString;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// View of one table row, keyed for sorting
///
/// Only the leading two fields are parsed eagerly; the raw line is kept as
/// bytes and written back verbatim. Rows are produced by this tool, so a
/// malformed row only appears if the file was modified between the write
/// and the sort.
#[derive(Debug)]
pub struct TableRowView<'a> {
    /// Original line bytes, without trailing newline
    pub line: &'a [u8],
    /// Reference chromosome (field 0)
    pub ref_chrom: &'a str,
    /// Reference start (field 1)
    pub ref_start: u64,
}

impl<'a> TableRowView<'a> {
    /// Parse the sort key out of a row
    pub fn parse(line: &'a [u8], line_number: usize) -> SortResult<Self> {
        let first_tab = memchr(b'\t', line).ok_or_else(|| TableSortError::InvalidRow {
            line: line_number,
            message: "Expected tab-separated fields".to_string(),
        })?;
        let rest = &line[first_tab + 1..];
        let second_tab = memchr(b'\t', rest).ok_or_else(|| TableSortError::InvalidRow {
            line: line_number,
            message: "Expected at least 3 fields".to_string(),
        })?;

        let ref_chrom =
            std::str::from_utf8(&line[..first_tab]).map_err(|_| TableSortError::InvalidRow {
                line: line_number,
                message: "Chromosome field is not valid UTF-8".to_string(),
            })?;

        let start_bytes = &rest[..second_tab];
        let start_str =
            std::str::from_utf8(start_bytes).map_err(|_| TableSortError::InvalidRow {
                line: line_number,
                message: "Start field is not valid UTF-8".to_string(),
            })?;
        let ref_start = start_str
            .parse::<u64>()
            .map_err(|_| TableSortError::InvalidRow {
                line: line_number,
                message: format!("Start field '{}' is not an integer", start_str),
            })?;

        Ok(Self {
            line,
            ref_chrom,
            ref_start,
        })
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut os: OsString = path.as_os_str().to_os_string();
    os.push(".tmp");
    PathBuf::from(os)
}

/// Sort a table file in place by (refChrom lexicographic, refStart numeric)
///
/// Stable in-memory sort; ties beyond the two key fields keep their input
/// order, matching `sort -k1,1 -k2,2n`.
pub fn sort_table_file(path: &Path) -> SortResult<()> {
    let data = fs::read(path)?;

    let mut rows: Vec<TableRowView> = Vec::new();
    let mut line_number = 0;
    for line in data.split(|&b| b == b'\n') {
        line_number += 1;
        if line.is_empty() {
            continue;
        }
        rows.push(TableRowView::parse(line, line_number)?);
    }

    rows.sort_by(|a, b| {
        a.ref_chrom
            .cmp(b.ref_chrom)
            .then_with(|| a.ref_start.cmp(&b.ref_start))
    });

    let tmp = tmp_path(path);
    {
        let mut writer = BufWriter::with_capacity(128 * 1024, fs::File::create(&tmp)?);
        for row in &rows {
            writer.write_all(row.line)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
    }
    fs::rename(&tmp, path)?;

    Ok(())
}
