//! svsieve: streaming sieve for structural-variant-informative alignments
//!
//! # Overview
//!
//! svsieve makes a single pass over an ordered BAM stream and keeps every
//! record belonging to a read with local structural-variant evidence —
//! discordant pairing, a supplementary alignment, an SA tag, or a soft
//! clip/indel of sufficient size — including records seen *before* the
//! evidence, via a bounded look-back window. The output is a reduced copy
//! of the input: same format, original order, byte-identical records.
//!
//! Memory stays bounded regardless of input size: the look-back window
//! holds a fixed number of records and the only unbounded state is a set
//! of 64-bit read-name fingerprints.
//!
//! # Quick Start
//!
//! ```no_run
//! use svsieve::{filter_alignments, FilterConfig};
//!
//! # fn main() -> svsieve::Result<()> {
//! let config = FilterConfig {
//!     min_within_size: 30,
//!     clip_length: 15,
//!     threads: 4,
//!     ..FilterConfig::default()
//! };
//!
//! let written = filter_alignments("sample.bam", "sample.sv_reads.bam", &config)?;
//! println!("kept {} records", written);
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`filter`]: the streaming core (fingerprinting, interest
//!   classification, look-back window, output batching, driver)
//! - [`io`]: BGZF transport and the native BAM reader/writer
//! - [`error`]: crate-level error type

#![warn(missing_docs)]

pub mod error;
pub mod filter;
pub mod io;

pub use error::{Result, SvsieveError};
pub use filter::{filter_alignments, run_filter, FilterConfig};
pub use io::bam::{BamReader, BamWriter, CigarOp, Header, Record, Reference};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
