//! Output batching.
//!
//! Records resolved "keep" accumulate here and are written to the output
//! transport in blocks, amortizing per-write overhead. A record handed to
//! the writer is dropped immediately afterwards; the batch is the last
//! owner on the keep path.

use crate::io::bam::BamWriter;
use log::debug;
use std::io::{self, Write};

use crate::io::bam::Record;

/// Ordered batch of records awaiting write.
#[derive(Debug, Default)]
pub struct OutputBatcher {
    pending: Vec<Record>,
    written: u64,
}

impl OutputBatcher {
    /// Create an empty batcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record to the pending batch.
    pub fn add(&mut self, record: Record) {
        self.pending.push(record);
    }

    /// Write and clear the batch if it holds more than `max_size` records.
    ///
    /// On a write failure the whole run aborts; pending records after the
    /// failing one are abandoned, records already handed to the transport
    /// are not retracted.
    pub fn flush_if_over<W: Write>(
        &mut self,
        max_size: usize,
        writer: &mut BamWriter<W>,
    ) -> io::Result<()> {
        if self.pending.len() > max_size {
            self.flush_all(writer)?;
        }
        Ok(())
    }

    /// Unconditionally write every pending record in order and clear.
    pub fn flush_all<W: Write>(&mut self, writer: &mut BamWriter<W>) -> io::Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        debug!("flushing {} records to output", self.pending.len());
        for record in self.pending.drain(..) {
            writer.write_record(&record)?;
            self.written += 1;
        }
        Ok(())
    }

    /// Number of pending (unwritten) records.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Total records written so far.
    pub fn written(&self) -> u64 {
        self.written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::bam::record::testutil::record_bytes;
    use crate::io::bam::Header;

    fn record(name: &str) -> Record {
        Record::from_bytes(record_bytes(name, 0, &[], b"")).unwrap()
    }

    fn writer() -> BamWriter<Vec<u8>> {
        BamWriter::new(Vec::new(), &Header::new(String::new(), Vec::new())).unwrap()
    }

    #[test]
    fn test_threshold_flush() {
        let mut writer = writer();
        let mut batcher = OutputBatcher::new();

        batcher.add(record("a"));
        batcher.flush_if_over(2, &mut writer).unwrap();
        assert_eq!(batcher.pending(), 1);
        assert_eq!(batcher.written(), 0);

        batcher.add(record("b"));
        batcher.add(record("c"));
        batcher.flush_if_over(2, &mut writer).unwrap();
        assert_eq!(batcher.pending(), 0);
        assert_eq!(batcher.written(), 3);
    }

    #[test]
    fn test_flush_all_empties() {
        let mut writer = writer();
        let mut batcher = OutputBatcher::new();
        batcher.add(record("a"));
        batcher.flush_all(&mut writer).unwrap();
        batcher.flush_all(&mut writer).unwrap();
        assert_eq!(batcher.written(), 1);
        assert_eq!(batcher.pending(), 0);
    }
}
