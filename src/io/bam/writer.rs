//! BAM streaming writer.
//!
//! Always writes BGZF output with a single encode thread. The header goes
//! out at construction, before any record; records are emitted as their raw
//! on-disk bytes, untouched.

use super::header::{write_header, Header};
use super::record::Record;
use crate::error::Result;
use crate::io::compression::BgzfWriter;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// BGZF BAM writer.
pub struct BamWriter<W: Write> {
    inner: BgzfWriter<W>,
}

impl<W: Write> BamWriter<W> {
    /// Create a writer over any byte sink and emit the header.
    pub fn new(writer: W, header: &Header) -> io::Result<Self> {
        let mut inner = BgzfWriter::new(writer);
        write_header(&mut inner, header)?;
        Ok(Self { inner })
    }

    /// Write one record as its exact input bytes.
    pub fn write_record(&mut self, record: &Record) -> io::Result<()> {
        self.inner.write_all(record.as_bytes())
    }

    /// Flush remaining blocks, write the BGZF EOF marker, and return the
    /// underlying sink. Must be called; dropping the writer loses the EOF
    /// marker and any buffered tail.
    pub fn finish(self) -> io::Result<W> {
        self.inner.finish()
    }
}

impl BamWriter<BufWriter<File>> {
    /// Create an output BAM file at `path` with the given header.
    pub fn create<P: AsRef<Path>>(path: P, header: &Header) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file), header)?)
    }
}
