//! Interest classification: the grow-only fingerprint set and the
//! per-record predicate that feeds it.
//!
//! A read classified interesting stays interesting for the rest of the
//! stream — its supplementary alignment may show up thousands of records
//! later — so the set only ever grows. No eviction, no capacity bound.

use super::FilterConfig;
use crate::io::bam::{CigarOp, Record};
use ahash::AHashSet;
use std::io;

/// Grow-only set of read-name fingerprints classified interesting.
#[derive(Debug, Default)]
pub struct InterestSet {
    names: AHashSet<u64>,
}

impl InterestSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a fingerprint interesting. Idempotent; never undone.
    pub fn insert(&mut self, fingerprint: u64) {
        self.names.insert(fingerprint);
    }

    /// Membership test.
    pub fn contains(&self, fingerprint: u64) -> bool {
        self.names.contains(&fingerprint)
    }

    /// Number of distinct interesting fingerprints.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no fingerprint has been marked yet.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Whether a record is exempt from classification.
///
/// Duplicates, unmapped reads, CIGAR-less records, and nameless records
/// never classify themselves. They still enter the look-back window and are
/// retained when a same-named record elsewhere is interesting.
pub(crate) fn exempt_from_classification(record: &Record) -> bool {
    record.is_duplicate()
        || record.is_unmapped()
        || record.cigar_len() == 0
        || record.name().is_empty()
}

/// Evaluate the interest predicate on a single record's intrinsic fields.
///
/// Checks in fixed priority order with early exit:
/// 1. discordant pair (paired but not properly paired) or supplementary
///    alignment flag,
/// 2. SA (supplementary alignment) tag,
/// 3. first CIGAR soft clip >= `clip_length` (only when `clip_length` is
///    positive) or insertion/deletion >= `min_within_size`.
pub(crate) fn satisfies_interest(record: &Record, config: &FilterConfig) -> io::Result<bool> {
    if (record.is_paired() && !record.is_proper_pair()) || record.is_supplementary() {
        return Ok(true);
    }

    if record.tags().contains(*b"SA")? {
        return Ok(true);
    }

    let check_clips = config.clip_length > 0;
    for op in record.cigar() {
        match op? {
            CigarOp::SoftClip(len) if check_clips && len >= config.clip_length as u32 => {
                return Ok(true)
            }
            CigarOp::Insertion(len) | CigarOp::Deletion(len) if len >= config.min_within_size => {
                return Ok(true)
            }
            _ => {}
        }
    }

    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::bam::record::testutil::record_bytes;
    use crate::io::bam::record::{
        FLAG_DUPLICATE, FLAG_PAIRED, FLAG_PROPER_PAIR, FLAG_SUPPLEMENTARY, FLAG_UNMAPPED,
    };

    fn config() -> FilterConfig {
        FilterConfig {
            min_within_size: 30,
            clip_length: 20,
            ..FilterConfig::default()
        }
    }

    fn record(name: &str, flags: u16, cigar: &[CigarOp], tags: &[u8]) -> Record {
        Record::from_bytes(record_bytes(name, flags, cigar, tags)).unwrap()
    }

    #[test]
    fn test_set_is_grow_only() {
        let mut set = InterestSet::new();
        assert!(set.is_empty());
        set.insert(42);
        set.insert(42);
        assert_eq!(set.len(), 1);
        assert!(set.contains(42));
        assert!(!set.contains(7));
    }

    #[test]
    fn test_discordant_pair_is_interesting() {
        let r = record("d", FLAG_PAIRED, &[CigarOp::Match(100)], b"");
        assert!(satisfies_interest(&r, &config()).unwrap());
    }

    #[test]
    fn test_proper_pair_is_not() {
        let r = record(
            "p",
            FLAG_PAIRED | FLAG_PROPER_PAIR,
            &[CigarOp::Match(100)],
            b"",
        );
        assert!(!satisfies_interest(&r, &config()).unwrap());
    }

    #[test]
    fn test_unpaired_single_end_is_not_discordant() {
        let r = record("s", 0, &[CigarOp::Match(100)], b"");
        assert!(!satisfies_interest(&r, &config()).unwrap());
    }

    #[test]
    fn test_supplementary_flag_is_interesting() {
        let r = record("s", FLAG_SUPPLEMENTARY, &[CigarOp::Match(100)], b"");
        assert!(satisfies_interest(&r, &config()).unwrap());
    }

    #[test]
    fn test_sa_tag_is_interesting() {
        let r = record(
            "sa",
            FLAG_PAIRED | FLAG_PROPER_PAIR,
            &[CigarOp::Match(100)],
            b"SAZchr1,5,+,50M50S,60,0;\0",
        );
        assert!(satisfies_interest(&r, &config()).unwrap());
    }

    #[test]
    fn test_clip_threshold_boundary() {
        let cfg = config();
        let at = record("c", 0, &[CigarOp::SoftClip(20), CigarOp::Match(80)], b"");
        let below = record("c", 0, &[CigarOp::SoftClip(19), CigarOp::Match(81)], b"");
        assert!(satisfies_interest(&at, &cfg).unwrap());
        assert!(!satisfies_interest(&below, &cfg).unwrap());
    }

    #[test]
    fn test_clip_check_disabled_when_nonpositive() {
        let mut cfg = config();
        cfg.clip_length = 0;
        let huge_clip = record("c", 0, &[CigarOp::SoftClip(500), CigarOp::Match(100)], b"");
        assert!(!satisfies_interest(&huge_clip, &cfg).unwrap());

        cfg.clip_length = -1;
        assert!(!satisfies_interest(&huge_clip, &cfg).unwrap());
    }

    #[test]
    fn test_indel_threshold_boundary() {
        let cfg = config();
        let ins_at = record(
            "i",
            0,
            &[CigarOp::Match(50), CigarOp::Insertion(30), CigarOp::Match(50)],
            b"",
        );
        let ins_below = record(
            "i",
            0,
            &[CigarOp::Match(50), CigarOp::Insertion(29), CigarOp::Match(50)],
            b"",
        );
        let del_at = record(
            "d",
            0,
            &[CigarOp::Match(50), CigarOp::Deletion(30), CigarOp::Match(50)],
            b"",
        );
        assert!(satisfies_interest(&ins_at, &cfg).unwrap());
        assert!(!satisfies_interest(&ins_below, &cfg).unwrap());
        assert!(satisfies_interest(&del_at, &cfg).unwrap());
    }

    #[test]
    fn test_exempt_records() {
        assert!(exempt_from_classification(&record(
            "dup",
            FLAG_DUPLICATE,
            &[CigarOp::Match(100)],
            b""
        )));
        assert!(exempt_from_classification(&record(
            "unmapped",
            FLAG_UNMAPPED,
            &[CigarOp::Match(100)],
            b""
        )));
        assert!(exempt_from_classification(&record("nocigar", 0, &[], b"")));
        assert!(exempt_from_classification(&record(
            "",
            0,
            &[CigarOp::Match(100)],
            b""
        )));
        assert!(!exempt_from_classification(&record(
            "plain",
            0,
            &[CigarOp::Match(100)],
            b""
        )));
    }
}
