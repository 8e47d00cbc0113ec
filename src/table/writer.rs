//! Table emission
//!
//! Serializes alignment blocks as tab-separated rows and drives the whole
//! chain-to-table conversion.

use crate::core::{open_chain_source, AlignmentBlock, BlockReader, ChainTabError};
use crate::table::sort::sort_table_file;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Statistics for one conversion run
#[derive(Debug, Clone, Copy, Default)]
pub struct ConversionStats {
    /// Chain sessions consumed
    pub chains: usize,
    /// Alignment-block rows written
    pub blocks: usize,
}

/// Writes alignment blocks as 6-column tab-separated rows
///
/// Field order is fixed: refChrom, refStart, refEnd, qryChrom, qryStart,
/// qryEnd. Rows are written in production order; sorting happens afterwards.
pub struct TableWriter<W: Write> {
    inner: W,
}

impl<W: Write> TableWriter<W> {
    /// Wrap a writer (callers should hand in something buffered)
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Write one block as a single row
    pub fn write_block(&mut self, block: &AlignmentBlock) -> std::io::Result<()> {
        writeln!(
            self.inner,
            "{}\t{}\t{}\t{}\t{}\t{}",
            block.ref_chrom,
            block.ref_start,
            block.ref_end,
            block.qry_chrom,
            block.qry_start,
            block.qry_end
        )
    }

    /// Flush and return the underlying writer
    pub fn finish(mut self) -> std::io::Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Convert a chain file into a coordinate-sorted alignment-block table
///
/// Streams blocks straight from the parser into the output file (created or
/// truncated), then sorts the table in place by reference chromosome and
/// numeric start. Any parse or I/O error aborts the run; rows flushed before
/// the error are not rolled back.
pub fn convert_chain(chain: &Path, output: &Path) -> Result<ConversionStats, ChainTabError> {
    let reader = open_chain_source(chain)?;
    let mut block_reader = BlockReader::new(reader);

    // Use BufWriter to avoid per-line syscalls
    let mut writer = TableWriter::new(BufWriter::with_capacity(
        128 * 1024,
        File::create(output)?,
    ));

    let mut stats = ConversionStats::default();
    while let Some(block) = block_reader.next_block()? {
        writer.write_block(&block)?;
        stats.blocks += 1;
    }
    stats.chains = block_reader.sessions();
    writer.finish()?;

    sort_table_file(output)?;

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_format() {
        let block = AlignmentBlock {
            ref_chrom: "chr1".to_string(),
            ref_start: 0,
            ref_end: 200,
            qry_chrom: "chrA".to_string(),
            qry_start: 100,
            qry_end: 300,
        };

        let mut writer = TableWriter::new(Vec::new());
        writer.write_block(&block).unwrap();
        let out = writer.finish().unwrap();

        assert_eq!(out, b"chr1\t0\t200\tchrA\t100\t300\n");
    }

    #[test]
    fn test_reverse_strand_row_keeps_descending_pair() {
        let block = AlignmentBlock {
            ref_chrom: "chr1".to_string(),
            ref_start: 210,
            ref_end: 290,
            qry_chrom: "chrA".to_string(),
            qry_start: 1680,
            qry_end: 1600,
        };

        let mut writer = TableWriter::new(Vec::new());
        writer.write_block(&block).unwrap();
        let out = writer.finish().unwrap();

        assert_eq!(out, b"chr1\t210\t290\tchrA\t1680\t1600\n");
    }
}
