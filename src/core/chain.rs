//! Chain file parsing and block projection
//!
//! Parses pairwise genome-alignment chain files and projects every ungapped
//! alignment block into absolute reference/query coordinates.
//!
//! # Chain File Format
//!
//! ```text
//! chain score refName refSize refStrand refStart refEnd qryName qrySize qryStrand qryStart qryEnd id
//! width dref dqry
//! width dref dqry
//! width
//! ```
//!
//! - Header line starts with "chain"
//! - Data lines contain: width (ungapped block), dref (gap in reference), dqry (gap in query)
//! - Last data line of a chain has only width (no gaps)
//! - Blank lines and `#` comments may appear anywhere

use crate::core::error::{ChainParseError, ChainResult};
use log::debug;
use std::io::BufRead;

/// Strand orientation of the query alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Strand {
    #[default]
    Plus,
    Minus,
}

impl Strand {
    /// Parse strand from a header token
    ///
    /// # Examples
    /// ```
    /// use chaintab::core::Strand;
    /// assert_eq!(Strand::from_token("+"), Some(Strand::Plus));
    /// assert_eq!(Strand::from_token("-"), Some(Strand::Minus));
    /// assert_eq!(Strand::from_token("."), None);
    /// ```
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "+" => Some(Strand::Plus),
            "-" => Some(Strand::Minus),
            _ => None,
        }
    }
}

/// Parsed chain header information
///
/// Only the fields the block projection needs are retained. Header token
/// positions (0-indexed): 2 = reference chromosome, 5 = reference block
/// start, 6 = reference block end, 7 = query chromosome, 8 = query
/// chromosome size, 9 = query strand, 10 = query block start. The query
/// block start is strand-relative, exactly as stored in the file.
#[derive(Debug, Clone)]
pub struct ChainHeader {
    /// Reference chromosome name
    pub ref_chrom: String,
    /// Reference block start (0-based)
    pub ref_start: u64,
    /// Reference block end (exclusive)
    pub ref_end: u64,
    /// Query chromosome name
    pub qry_chrom: String,
    /// Query chromosome total length
    pub qry_size: u64,
    /// Query strand
    pub qry_strand: Strand,
    /// Query block start (0-based, strand-relative)
    pub qry_start: u64,
}

fn parse_u64(field: &'static str, value: &str, line: usize) -> ChainResult<u64> {
    value.parse::<u64>().map_err(|_| ChainParseError::ParseInt {
        line,
        field,
        value: value.to_string(),
    })
}

impl ChainHeader {
    /// Parse a chain header line
    ///
    /// Format: chain score refName refSize refStrand refStart refEnd qryName qrySize qryStrand qryStart qryEnd id
    pub fn parse(line: &str, line_number: usize) -> ChainResult<Self> {
        let fields: Vec<&str> = line.split_whitespace().collect();

        if fields.len() < 11 {
            return Err(ChainParseError::InvalidHeader {
                line: line_number,
                message: format!("Expected 11+ fields, got {}", fields.len()),
            });
        }

        if fields[0] != "chain" {
            return Err(ChainParseError::InvalidHeader {
                line: line_number,
                message: format!("Expected 'chain' keyword, got '{}'", fields[0]),
            });
        }

        let ref_chrom = fields[2].to_string();
        let ref_start = parse_u64("reference start", fields[5], line_number)?;
        let ref_end = parse_u64("reference end", fields[6], line_number)?;

        if ref_start > ref_end {
            return Err(ChainParseError::InvalidCoordinates {
                line: line_number,
                message: format!(
                    "Reference start ({}) > reference end ({})",
                    ref_start, ref_end
                ),
            });
        }

        let qry_chrom = fields[7].to_string();
        let qry_size = parse_u64("query size", fields[8], line_number)?;

        let qry_strand = Strand::from_token(fields[9]).ok_or_else(|| {
            ChainParseError::InvalidStrand {
                line: line_number,
                strand: fields[9].to_string(),
            }
        })?;

        let qry_start = parse_u64("query start", fields[10], line_number)?;

        Ok(Self {
            ref_chrom,
            ref_start,
            ref_end,
            qry_chrom,
            qry_size,
            qry_strand,
            qry_start,
        })
    }
}

/// An ungapped alignment block in absolute coordinates
///
/// One block per chain data line. Coordinates are half-open `[start, end)`.
/// For reverse-strand chains the query pair is mirrored against the query
/// chromosome length and is therefore numerically descending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentBlock {
    /// Reference chromosome name
    pub ref_chrom: String,
    /// Reference start position (0-based)
    pub ref_start: u64,
    /// Reference end position (exclusive)
    pub ref_end: u64,
    /// Query chromosome name
    pub qry_chrom: String,
    /// Query start position (mirrored for reverse strand)
    pub qry_start: u64,
    /// Query end position (mirrored for reverse strand)
    pub qry_end: u64,
}

/// Data line in a chain file (width, dref, dqry)
#[derive(Debug, Clone, Copy)]
struct GapLine {
    /// Ungapped block width
    width: u64,
    /// Gap after the block in the reference
    ref_gap: u64,
    /// Gap after the block in the query
    qry_gap: u64,
    /// A 1-field record closes the chain; offsets must not advance
    terminal: bool,
}

impl GapLine {
    /// Parse a data line (middle line with 3 fields or last line with 1 field)
    fn parse(line: &str, line_number: usize) -> ChainResult<Self> {
        let fields: Vec<&str> = line.split_whitespace().collect();

        match fields.len() {
            1 => {
                let width = parse_u64("block width", fields[0], line_number)?;
                Ok(Self {
                    width,
                    ref_gap: 0,
                    qry_gap: 0,
                    terminal: true,
                })
            }
            3 => {
                let width = parse_u64("block width", fields[0], line_number)?;
                let ref_gap = parse_u64("reference gap", fields[1], line_number)?;
                let qry_gap = parse_u64("query gap", fields[2], line_number)?;
                Ok(Self {
                    width,
                    ref_gap,
                    qry_gap,
                    terminal: false,
                })
            }
            n => Err(ChainParseError::InvalidDataLine {
                line: line_number,
                message: format!("Expected 1 or 3 fields, got {}", n),
            }),
        }
    }
}

/// Per-session projection state: the active header plus running offsets
///
/// Both offsets start at zero on every header line and advance only on
/// non-terminal data lines, by block width plus the corresponding gap.
#[derive(Debug)]
struct Session {
    header: ChainHeader,
    ref_offset: u64,
    qry_offset: u64,
}

impl Session {
    fn new(header: ChainHeader) -> Self {
        Self {
            header,
            ref_offset: 0,
            qry_offset: 0,
        }
    }

    /// Project one data line into an alignment block and advance offsets
    fn project(&mut self, gap: GapLine, line_number: usize) -> ChainResult<AlignmentBlock> {
        let ref_start = self.header.ref_start + self.ref_offset;
        let ref_end = ref_start + gap.width;

        // Raw query coordinates in the strand-relative frame of the file
        let raw_start = self.header.qry_start + self.qry_offset;
        let raw_end = raw_start + gap.width;

        let (qry_start, qry_end) = match self.header.qry_strand {
            Strand::Plus => (raw_start, raw_end),
            Strand::Minus => {
                // Mirror both bounds against the chromosome length. The pair
                // comes out descending; downstream consumers read strand
                // orientation from that ordering.
                let start = self.header.qry_size.checked_sub(raw_start).ok_or_else(|| {
                    ChainParseError::InvalidCoordinates {
                        line: line_number,
                        message: format!(
                            "Query position {} exceeds chromosome size {}",
                            raw_start, self.header.qry_size
                        ),
                    }
                })?;
                let end = self.header.qry_size.checked_sub(raw_end).ok_or_else(|| {
                    ChainParseError::InvalidCoordinates {
                        line: line_number,
                        message: format!(
                            "Query position {} exceeds chromosome size {}",
                            raw_end, self.header.qry_size
                        ),
                    }
                })?;
                (start, end)
            }
        };

        let block = AlignmentBlock {
            ref_chrom: self.header.ref_chrom.clone(),
            ref_start,
            ref_end,
            qry_chrom: self.header.qry_chrom.clone(),
            qry_start,
            qry_end,
        };

        if !gap.terminal {
            self.ref_offset += gap.width + gap.ref_gap;
            self.qry_offset += gap.width + gap.qry_gap;
        }

        Ok(block)
    }
}

/// Streaming reader over a chain file, yielding one block per data line
///
/// Wraps any `BufRead` source and walks it a line at a time: header lines
/// open a new session, data lines are projected through the running offsets,
/// blank lines and `#` comments are skipped without touching state.
pub struct BlockReader<R: BufRead> {
    reader: R,
    line_buf: String,
    line_number: usize,
    sessions: usize,
    session: Option<Session>,
}

impl<R: BufRead> BlockReader<R> {
    /// Create a reader over a chain line source
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_buf: String::with_capacity(256),
            line_number: 0,
            sessions: 0,
            session: None,
        }
    }

    /// Read the next alignment block, or `None` at end of input
    ///
    /// Any malformed line aborts the stream with an error carrying the
    /// 1-based line number; there is no recovery.
    pub fn next_block(&mut self) -> ChainResult<Option<AlignmentBlock>> {
        loop {
            self.line_buf.clear();
            let bytes_read = self.reader.read_line(&mut self.line_buf)?;
            if bytes_read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let trimmed = self.line_buf.trim();

            // Comments and blank lines are ignorable anywhere and never
            // perturb the running offsets.
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            if trimmed.split_whitespace().next() == Some("chain") {
                let header = ChainHeader::parse(trimmed, self.line_number)?;
                debug!(
                    "chain session at line {}: {} -> {} ({:?})",
                    self.line_number, header.ref_chrom, header.qry_chrom, header.qry_strand
                );
                self.sessions += 1;
                self.session = Some(Session::new(header));
                continue;
            }

            let gap = GapLine::parse(trimmed, self.line_number)?;
            let session = self.session.as_mut().ok_or_else(|| {
                ChainParseError::InvalidDataLine {
                    line: self.line_number,
                    message: "Data line before any chain header".to_string(),
                }
            })?;

            return session.project(gap, self.line_number).map(Some);
        }
    }

    /// 1-based number of the last line read
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Number of chain sessions seen so far
    pub fn sessions(&self) -> usize {
        self.sessions
    }
}

/// Parse a chain source into a vector of alignment blocks
///
/// Convenience collector over [`BlockReader`].
pub fn parse_chain_reader<R: BufRead>(reader: R) -> ChainResult<Vec<AlignmentBlock>> {
    let mut blocks = Vec::new();
    let mut block_reader = BlockReader::new(reader);
    while let Some(block) = block_reader.next_block()? {
        blocks.push(block);
    }
    Ok(blocks)
}

/// Parse a chain file from bytes (for testing)
pub fn parse_chain_bytes(data: &[u8]) -> ChainResult<Vec<AlignmentBlock>> {
    parse_chain_reader(std::io::BufReader::new(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chain_header() {
        let line = "chain 100 chr1 1000 + 0 500 chrA 2000 + 100 600 1";
        let header = ChainHeader::parse(line, 1).unwrap();

        assert_eq!(header.ref_chrom, "chr1");
        assert_eq!(header.ref_start, 0);
        assert_eq!(header.ref_end, 500);
        assert_eq!(header.qry_chrom, "chrA");
        assert_eq!(header.qry_size, 2000);
        assert_eq!(header.qry_strand, Strand::Plus);
        assert_eq!(header.qry_start, 100);
    }

    #[test]
    fn test_parse_chain_header_minus_strand() {
        let line = "chain 4900 chr2 243199373 + 5000 15000 chrB 180000 - 2000 12000 2";
        let header = ChainHeader::parse(line, 1).unwrap();

        assert_eq!(header.qry_strand, Strand::Minus);
        assert_eq!(header.qry_size, 180000);
        assert_eq!(header.qry_start, 2000);
    }

    #[test]
    fn test_parse_chain_header_without_id_field() {
        // 11 tokens is the minimum; the trailing id is optional here
        let line = "chain 100 chr1 1000 + 0 500 chrA 2000 + 100";
        let header = ChainHeader::parse(line, 1).unwrap();
        assert_eq!(header.qry_start, 100);
    }

    #[test]
    fn test_error_too_few_fields() {
        let line = "chain 100 chr1 1000 + 0 500";
        let err = ChainHeader::parse(line, 3).unwrap_err();
        assert!(matches!(err, ChainParseError::InvalidHeader { line: 3, .. }));
        assert!(err.to_string().contains("11+"));
    }

    #[test]
    fn test_error_invalid_strand() {
        let line = "chain 100 chr1 1000 + 0 500 chrA 2000 X 100 600 1";
        let err = ChainHeader::parse(line, 5).unwrap_err();
        assert!(matches!(err, ChainParseError::InvalidStrand { line: 5, .. }));
        assert!(err.to_string().contains("'X'"));
    }

    #[test]
    fn test_error_invalid_number() {
        let line = "chain 100 chr1 1000 + abc 500 chrA 2000 + 100 600 1";
        let err = ChainHeader::parse(line, 7).unwrap_err();
        assert!(matches!(err, ChainParseError::ParseInt { line: 7, .. }));
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn test_error_ref_start_after_end() {
        let line = "chain 100 chr1 1000 + 500 400 chrA 2000 + 100 600 1";
        let err = ChainHeader::parse(line, 1).unwrap_err();
        assert!(matches!(err, ChainParseError::InvalidCoordinates { .. }));
    }

    #[test]
    fn test_parse_gap_line_three_fields() {
        let gap = GapLine::parse("100 50 30", 1).unwrap();
        assert_eq!(gap.width, 100);
        assert_eq!(gap.ref_gap, 50);
        assert_eq!(gap.qry_gap, 30);
        assert!(!gap.terminal);
    }

    #[test]
    fn test_parse_gap_line_one_field() {
        let gap = GapLine::parse("200", 1).unwrap();
        assert_eq!(gap.width, 200);
        assert_eq!(gap.ref_gap, 0);
        assert_eq!(gap.qry_gap, 0);
        assert!(gap.terminal);
    }

    #[test]
    fn test_error_gap_line_two_fields() {
        let err = GapLine::parse("100 50", 10).unwrap_err();
        assert!(matches!(
            err,
            ChainParseError::InvalidDataLine { line: 10, .. }
        ));
    }

    #[test]
    fn test_single_block_forward() {
        let data = b"\
chain 100 chr1 1000 + 40 140 chrA 2000 + 7 107 1
100
";
        let blocks = parse_chain_bytes(data).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(
            blocks[0],
            AlignmentBlock {
                ref_chrom: "chr1".to_string(),
                ref_start: 40,
                ref_end: 140,
                qry_chrom: "chrA".to_string(),
                qry_start: 7,
                qry_end: 107,
            }
        );
    }

    #[test]
    fn test_gapped_blocks_forward() {
        // Second block starts at first end plus the declared gaps
        let data = b"\
chain 100 chr1 1000 + 0 500 chrA 2000 + 100 600 1
200 10 20
80
";
        let blocks = parse_chain_bytes(data).unwrap();
        assert_eq!(blocks.len(), 2);

        assert_eq!(blocks[0].ref_start, 0);
        assert_eq!(blocks[0].ref_end, 200);
        assert_eq!(blocks[0].qry_start, 100);
        assert_eq!(blocks[0].qry_end, 300);

        assert_eq!(blocks[1].ref_start, 210);
        assert_eq!(blocks[1].ref_end, 290);
        assert_eq!(blocks[1].qry_start, 320);
        assert_eq!(blocks[1].qry_end, 400);
    }

    #[test]
    fn test_reverse_strand_mirrors_both_bounds() {
        // raw query interval is 100..300; mirrored against size 2000 the
        // emitted pair is (1900, 1700), descending by construction
        let data = b"\
chain 100 chr1 1000 + 0 500 chrA 2000 - 100 600 1
200 10 20
80
";
        let blocks = parse_chain_bytes(data).unwrap();
        assert_eq!(blocks.len(), 2);

        assert_eq!(blocks[0].qry_start, 2000 - 100);
        assert_eq!(blocks[0].qry_end, 2000 - 300);
        assert!(blocks[0].qry_start > blocks[0].qry_end);

        // raw 320..400 -> (1680, 1600)
        assert_eq!(blocks[1].qry_start, 1680);
        assert_eq!(blocks[1].qry_end, 1600);

        // reference coordinates are untouched by the mirroring
        assert_eq!(blocks[1].ref_start, 210);
        assert_eq!(blocks[1].ref_end, 290);
    }

    #[test]
    fn test_reverse_strand_out_of_range() {
        // raw end 150 exceeds the declared chromosome size 120
        let data = b"\
chain 100 chr1 1000 + 0 500 chrA 120 - 50 120 1
100
";
        let err = parse_chain_bytes(data).unwrap_err();
        assert!(matches!(
            err,
            ChainParseError::InvalidCoordinates { line: 2, .. }
        ));
    }

    #[test]
    fn test_terminal_record_does_not_advance_offsets() {
        // A 3-field line after the 1-field record continues from the
        // unadvanced offsets
        let data = b"\
chain 100 chr1 1000 + 0 500 chrA 2000 + 0 500 1
50
50 10 10
";
        let blocks = parse_chain_bytes(data).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].ref_start, 0);
        // terminal line advanced nothing, so the next block starts at 0 again
        assert_eq!(blocks[1].ref_start, 0);
    }

    #[test]
    fn test_new_header_resets_offsets() {
        let data = b"\
chain 100 chr1 1000 + 100 400 chrA 2000 + 100 400 1
100 50 50
100
chain 100 chr2 1000 + 5 105 chrB 2000 + 9 109 2
100
";
        let blocks = parse_chain_bytes(data).unwrap();
        assert_eq!(blocks.len(), 3);

        assert_eq!(blocks[1].ref_start, 250); // 100 + 100 + 50
        assert_eq!(blocks[1].qry_start, 250);

        // fresh session: offsets back to zero regardless of the prior chain
        assert_eq!(blocks[2].ref_chrom, "chr2");
        assert_eq!(blocks[2].ref_start, 5);
        assert_eq!(blocks[2].qry_chrom, "chrB");
        assert_eq!(blocks[2].qry_start, 9);
    }

    #[test]
    fn test_comments_and_blank_lines_ignored() {
        // Blank lines inside a chain do not end the session or move offsets
        let data = b"\
# generated by an external aligner
chain 100 chr1 1000 + 0 500 chrA 2000 + 100 600 1

200 10 20
# interleaved comment

80
";
        let blocks = parse_chain_bytes(data).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].ref_start, 210);
        assert_eq!(blocks[1].qry_start, 320);
    }

    #[test]
    fn test_row_count_matches_data_lines() {
        let data = b"\
chain 100 chr1 1000 + 0 300 chrA 2000 + 0 300 1
50 10 10
50 10 10
50
chain 100 chr2 1000 + 0 100 chrB 2000 + 0 100 2
100
";
        let blocks = parse_chain_bytes(data).unwrap();
        assert_eq!(blocks.len(), 4);
    }

    #[test]
    fn test_error_data_line_before_header() {
        let data = b"100 10 10\n";
        let err = parse_chain_bytes(data).unwrap_err();
        assert!(matches!(
            err,
            ChainParseError::InvalidDataLine { line: 1, .. }
        ));
        assert!(err.to_string().contains("before any chain header"));
    }

    #[test]
    fn test_error_line_number_reported() {
        let data = b"\
chain 100 chr1 1000 + 0 500 chrA 2000 + 100 600 1
not_a_number
";
        let err = parse_chain_bytes(data).unwrap_err();
        assert_eq!(err.line_number(), Some(2));
    }

    #[test]
    fn test_empty_input() {
        let blocks = parse_chain_bytes(b"").unwrap();
        assert!(blocks.is_empty());
    }

    #[test]
    fn test_comment_only_input() {
        let blocks = parse_chain_bytes(b"# nothing here\n\n").unwrap();
        assert!(blocks.is_empty());
    }
}
