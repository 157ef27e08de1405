//! BAM streaming reader.
//!
//! The header is read once during construction, then records are streamed
//! one at a time. Each record is handed out as an owned [`Record`] so it
//! can move between the look-back window and the output batch without
//! copying.

use super::header::{read_header, Header};
use super::record::Record;
use crate::error::Result;
use crate::io::compression::open_decoded;
use std::io::{self, BufRead};
use std::path::Path;

/// BAM reader over a decoded (decompressed) byte stream.
pub struct BamReader<R> {
    reader: R,
    header: Header,
}

impl<R: BufRead> BamReader<R> {
    /// Create a reader, consuming and validating the header immediately.
    pub fn new(mut reader: R) -> io::Result<Self> {
        let header = read_header(&mut reader)?;
        Ok(Self { reader, header })
    }

    /// The BAM header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Read a single record. `Ok(None)` at end of stream.
    pub fn read_record(&mut self) -> io::Result<Option<Record>> {
        let mut size_buf = [0u8; 4];
        match self.reader.read_exact(&mut size_buf) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e),
        }

        let block_size = i32::from_le_bytes(size_buf);
        if block_size < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid record block size: {}", block_size),
            ));
        }

        let mut data = vec![0u8; block_size as usize + 4];
        data[0..4].copy_from_slice(&size_buf);
        self.reader.read_exact(&mut data[4..])?;

        Record::from_bytes(data).map(Some)
    }

    /// Iterator over records.
    pub fn records(&mut self) -> Records<'_, R> {
        Records { reader: self }
    }
}

impl BamReader<Box<dyn BufRead + Send>> {
    /// Open a BAM file, BGZF-compressed or plain, with `decode_workers`
    /// extra decompression threads (0 decodes inline).
    pub fn open<P: AsRef<Path>>(path: P, decode_workers: usize) -> Result<Self> {
        let reader = open_decoded(path.as_ref(), decode_workers)?;
        Ok(Self::new(reader)?)
    }

    /// Open a BAM file with inline decoding.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open(path, 0)
    }
}

/// Iterator over BAM records, created by [`BamReader::records`].
pub struct Records<'a, R> {
    reader: &'a mut BamReader<R>,
}

impl<'a, R: BufRead> Iterator for Records<'a, R> {
    type Item = io::Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
