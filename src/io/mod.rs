//! I/O module: BGZF transport and the BAM reader/writer built on it.

pub mod bam;
pub mod compression;

pub use bam::{BamReader, BamWriter, Header, Record};
pub use compression::{BgzfReader, BgzfWriter, MMAP_THRESHOLD};
