//! Native BAM (Binary Alignment Map) transport.
//!
//! Streaming reader and writer over the BGZF layer in
//! [`crate::io::compression`]. The reader parses the header eagerly and
//! hands out records as owned raw-byte handles; the writer re-emits those
//! bytes untouched behind a freshly encoded header copy. Decode-side
//! parallelism lives entirely inside the BGZF layer; record parsing and
//! emission are strictly sequential.

pub mod cigar;
pub mod error;
pub mod header;
pub mod reader;
pub mod record;
pub mod tags;
pub mod writer;

pub use cigar::{CigarIter, CigarOp};
pub use error::BamDecodeError;
pub use header::{Header, Reference};
pub use reader::{BamReader, Records};
pub use record::Record;
pub use tags::Tags;
pub use writer::BamWriter;
