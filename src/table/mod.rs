//! Table output
//!
//! Writing alignment-block rows and the terminal sort/finalize pass.

pub mod sort;
pub mod writer;

pub use sort::{sort_table_file, TableRowView};
pub use writer::{convert_chain, ConversionStats, TableWriter};
