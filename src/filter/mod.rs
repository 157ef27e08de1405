//! Streaming filter core: single-pass selection of structural-variant
//! informative reads.
//!
//! One logical thread drives the whole pipeline:
//!
//! ```text
//! read record -> classify -> push into window
//!   window overflow -> resolve oldest against interest set
//!     keep -> output batch    drop -> freed
//!   batch overflow -> flush to output
//! end of stream -> drain window, flush batch
//! ```
//!
//! Classification is often completed by a *later* record of the same read
//! (its mate, or a supplementary alignment), which is why every record
//! waits in the bounded window before resolution. A read marked
//! interesting after an earlier same-named record has already left the
//! window does not resurrect that record; that recall limit is the price
//! of bounded memory and is tuned via [`FilterConfig::scope_capacity`].

pub mod batcher;
pub mod fingerprint;
pub mod interest;
pub mod scope;

pub use fingerprint::name_fingerprint;
pub use interest::InterestSet;
pub use scope::{ScopeEntry, ScopeWindow};

use crate::error::{Result, SvsieveError};
use crate::io::bam::{BamReader, BamWriter};
use batcher::OutputBatcher;
use interest::{exempt_from_classification, satisfies_interest};
use log::{debug, info};
use std::io::{BufRead, Write};
use std::path::Path;

/// Configuration for a filtering run.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    /// Minimum insertion/deletion length that marks a read interesting.
    pub min_within_size: u32,
    /// Minimum soft-clip length that marks a read interesting; a value
    /// <= 0 disables clip-based classification entirely.
    pub clip_length: i32,
    /// Total worker-thread budget (>= 1). `threads - 1` go to input
    /// decode; output encode is always pinned to one thread.
    pub threads: usize,
    /// Look-back window bound, in records. Larger values recall more
    /// distant mates at linear memory cost.
    pub scope_capacity: usize,
    /// Pending-write count above which the output batch is flushed.
    pub batch_capacity: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_within_size: 30,
            clip_length: 15,
            threads: 1,
            scope_capacity: 100_000,
            batch_capacity: 500_000,
        }
    }
}

/// Run the filter over an open reader/writer pair.
///
/// Returns the number of records written. The writer is left unfinished so
/// callers control when the BGZF EOF marker goes out.
pub fn run_filter<R: BufRead, W: Write>(
    reader: &mut BamReader<R>,
    writer: &mut BamWriter<W>,
    config: &FilterConfig,
) -> Result<u64> {
    let mut scope = ScopeWindow::new();
    let mut interest = InterestSet::new();
    let mut batcher = OutputBatcher::new();

    // Ingest: classify each record before it enters the window, resolve
    // the oldest entry once the window is over capacity.
    while let Some(record) = reader.read_record()? {
        let fingerprint = name_fingerprint(record.name());

        if !exempt_from_classification(&record)
            && !interest.contains(fingerprint)
            && satisfies_interest(&record, config)?
        {
            interest.insert(fingerprint);
        }

        scope.push(fingerprint, record);

        if let Some(entry) = scope.pop_front_if_over(config.scope_capacity) {
            if interest.contains(entry.fingerprint) {
                batcher.add(entry.record);
            }
        }

        batcher.flush_if_over(config.batch_capacity, writer)?;
    }

    // Drain: every remaining entry gets its final resolution, then the
    // batch is flushed unconditionally.
    debug!(
        "input exhausted: draining {} windowed records, {} interesting reads",
        scope.len(),
        interest.len()
    );
    while let Some(entry) = scope.pop_front() {
        if interest.contains(entry.fingerprint) {
            batcher.add(entry.record);
        }
    }
    batcher.flush_all(writer)?;

    Ok(batcher.written())
}

/// Filter a BAM file into a reduced BGZF BAM copy.
///
/// Opens `input` (plain or BGZF-compressed BAM), copies its header to
/// `output` verbatim, streams every record through the filter, and
/// finalizes the output. Returns the number of records written.
///
/// Any transport failure (open, header, thread configuration, write,
/// close) aborts the run with the first error encountered.
pub fn filter_alignments<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    config: &FilterConfig,
) -> Result<u64> {
    if config.threads == 0 {
        return Err(SvsieveError::Config(
            "threads must be >= 1 (the main thread counts as one)".into(),
        ));
    }

    let mut reader = BamReader::open(input.as_ref(), config.threads - 1)?;
    let header = reader.header().clone();
    let mut writer = BamWriter::create(output.as_ref(), &header)?;

    let total = run_filter(&mut reader, &mut writer, config)?;
    writer.finish()?;

    info!(
        "wrote {} records from {} to {}",
        total,
        input.as_ref().display(),
        output.as_ref().display()
    );
    Ok(total)
}
