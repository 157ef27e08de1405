//! BAM record handle.
//!
//! The filter is a pass-through: every retained record must reach the output
//! byte-identical to how it arrived. `Record` therefore owns the exact
//! on-disk bytes of one alignment (the 4-byte block size followed by
//! `block_size` bytes of fields) and decodes only what classification needs
//! (flags, name, CIGAR, tags) lazily from those bytes. Nothing is ever
//! re-encoded.
//!
//! # Binary layout (little-endian, offsets include the block-size prefix)
//!
//! ```text
//! 0   block_size (int32)
//! 4   refID (int32)
//! 8   pos (int32)
//! 12  l_read_name (uint8, includes NUL)
//! 13  mapq (uint8)
//! 14  bin (uint16)
//! 16  n_cigar_op (uint16)
//! 18  flag (uint16)
//! 20  l_seq (int32)
//! 24  next_refID (int32)
//! 28  next_pos (int32)
//! 32  tlen (int32)
//! 36  read_name, cigar, seq (4-bit packed), qual, tags
//! ```

use super::cigar::CigarIter;
use super::error::BamDecodeError;
use super::tags::Tags;
use std::io;

/// Fixed-size portion of a record, counting the block-size prefix.
const FIXED_FIELDS_LEN: usize = 36;

/// SAM flag: template has multiple segments (paired).
pub const FLAG_PAIRED: u16 = 0x1;
/// SAM flag: each segment properly aligned.
pub const FLAG_PROPER_PAIR: u16 = 0x2;
/// SAM flag: segment unmapped.
pub const FLAG_UNMAPPED: u16 = 0x4;
/// SAM flag: PCR or optical duplicate.
pub const FLAG_DUPLICATE: u16 = 0x400;
/// SAM flag: supplementary alignment.
pub const FLAG_SUPPLEMENTARY: u16 = 0x800;

/// One alignment record, held as its exact on-disk bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Full record image: block-size prefix plus `block_size` bytes.
    data: Vec<u8>,
    /// Offset of the auxiliary-tag section (== data.len() when absent).
    tags_start: usize,
}

impl Record {
    /// Validate a raw record image and take ownership of it.
    ///
    /// `data` must contain the 4-byte block size followed by exactly
    /// `block_size` bytes. Section lengths (name, CIGAR, sequence, quality)
    /// are checked against the declared counts; CIGAR operation codes and
    /// tag contents are validated lazily on access.
    pub fn from_bytes(data: Vec<u8>) -> io::Result<Self> {
        if data.len() < FIXED_FIELDS_LEN {
            return Err(BamDecodeError::Truncated {
                context: "record fixed fields",
                expected: FIXED_FIELDS_LEN,
                actual: data.len(),
            }
            .into());
        }

        let block_size = i32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        if block_size < 0 {
            return Err(BamDecodeError::NegativeLength {
                field: "block size",
                value: block_size,
            }
            .into());
        }
        if block_size as usize + 4 != data.len() {
            return Err(BamDecodeError::Truncated {
                context: "record body",
                expected: block_size as usize + 4,
                actual: data.len(),
            }
            .into());
        }

        let l_read_name = data[12] as usize;
        if l_read_name == 0 {
            return Err(BamDecodeError::InvalidReadNameLength { length: 0 }.into());
        }

        let n_cigar_op = u16::from_le_bytes([data[16], data[17]]) as usize;

        let l_seq = i32::from_le_bytes([data[20], data[21], data[22], data[23]]);
        if l_seq < 0 {
            return Err(BamDecodeError::NegativeLength {
                field: "sequence length",
                value: l_seq,
            }
            .into());
        }
        let l_seq = l_seq as usize;

        let name_end = FIXED_FIELDS_LEN + l_read_name;
        let cigar_end = name_end + n_cigar_op * 4;
        let seq_end = cigar_end + l_seq.div_ceil(2);
        let tags_start = seq_end + l_seq;

        if tags_start > data.len() {
            return Err(BamDecodeError::Truncated {
                context: "record sections",
                expected: tags_start,
                actual: data.len(),
            }
            .into());
        }

        if data[name_end - 1] != 0 {
            return Err(BamDecodeError::MissingNulTerminator { field: "read name" }.into());
        }

        Ok(Self { data, tags_start })
    }

    /// The exact on-disk bytes, block-size prefix included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Bitwise SAM flags.
    pub fn flags(&self) -> u16 {
        u16::from_le_bytes([self.data[18], self.data[19]])
    }

    /// Read name without the NUL terminator. Empty for a record whose name
    /// field holds only the terminator.
    pub fn name(&self) -> &[u8] {
        let l_read_name = self.data[12] as usize;
        &self.data[FIXED_FIELDS_LEN..FIXED_FIELDS_LEN + l_read_name - 1]
    }

    /// Number of CIGAR operations.
    pub fn cigar_len(&self) -> usize {
        u16::from_le_bytes([self.data[16], self.data[17]]) as usize
    }

    /// Iterator over CIGAR operations, first to last.
    pub fn cigar(&self) -> CigarIter<'_> {
        let start = FIXED_FIELDS_LEN + self.data[12] as usize;
        CigarIter::new(&self.data[start..start + self.cigar_len() * 4])
    }

    /// View over the auxiliary-tag section.
    pub fn tags(&self) -> Tags<'_> {
        Tags::new(&self.data[self.tags_start..])
    }

    /// Check if the read is paired.
    pub fn is_paired(&self) -> bool {
        self.flags() & FLAG_PAIRED != 0
    }

    /// Check if the pair is flagged properly aligned.
    pub fn is_proper_pair(&self) -> bool {
        self.flags() & FLAG_PROPER_PAIR != 0
    }

    /// Check if the read is unmapped.
    pub fn is_unmapped(&self) -> bool {
        self.flags() & FLAG_UNMAPPED != 0
    }

    /// Check if the read is a PCR/optical duplicate.
    pub fn is_duplicate(&self) -> bool {
        self.flags() & FLAG_DUPLICATE != 0
    }

    /// Check if this is a supplementary alignment.
    pub fn is_supplementary(&self) -> bool {
        self.flags() & FLAG_SUPPLEMENTARY != 0
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use crate::io::bam::cigar::CigarOp;

    /// Build the raw byte image of a record for tests.
    pub fn record_bytes(name: &str, flags: u16, cigar: &[CigarOp], tags: &[u8]) -> Vec<u8> {
        let l_seq: u32 = cigar
            .iter()
            .filter(|op| op.consumes_query())
            .map(|op| op.length())
            .sum();

        let mut body = Vec::new();
        body.extend_from_slice(&0i32.to_le_bytes()); // refID
        body.extend_from_slice(&100i32.to_le_bytes()); // pos
        body.push((name.len() + 1) as u8); // l_read_name
        body.push(30); // mapq
        body.extend_from_slice(&0u16.to_le_bytes()); // bin
        body.extend_from_slice(&(cigar.len() as u16).to_le_bytes());
        body.extend_from_slice(&flags.to_le_bytes());
        body.extend_from_slice(&(l_seq as i32).to_le_bytes());
        body.extend_from_slice(&(-1i32).to_le_bytes()); // next_refID
        body.extend_from_slice(&(-1i32).to_le_bytes()); // next_pos
        body.extend_from_slice(&0i32.to_le_bytes()); // tlen
        body.extend_from_slice(name.as_bytes());
        body.push(0);
        for op in cigar {
            body.extend_from_slice(&op.to_word().to_le_bytes());
        }
        // 4-bit packed sequence (all A) and missing quality
        body.extend(std::iter::repeat(0x11).take((l_seq as usize).div_ceil(2)));
        body.extend(std::iter::repeat(0xFF).take(l_seq as usize));
        body.extend_from_slice(tags);

        let mut data = (body.len() as i32).to_le_bytes().to_vec();
        data.extend_from_slice(&body);
        data
    }
}
