//! BAM auxiliary tags.
//!
//! Tags are stored exactly as they appear on disk; the filter never rewrites
//! them, it only needs to answer one question per record: is an `SA`
//! (supplementary alignment) tag present. The view below walks the raw tag
//! bytes using the per-type value sizes from the SAM spec:
//!
//! - `A`, `c`, `C`: 1 byte
//! - `s`, `S`: 2 bytes
//! - `i`, `I`, `f`: 4 bytes
//! - `Z`, `H`: NUL-terminated
//! - `B`: 1-byte subtype + 4-byte count + count * subtype size

use super::error::BamDecodeError;
use std::io;

/// Borrowed view over the raw auxiliary-tag section of a record.
#[derive(Debug, Clone, Copy)]
pub struct Tags<'a> {
    data: &'a [u8],
}

impl<'a> Tags<'a> {
    /// Create a view over raw tag bytes.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// The raw tag bytes, exactly as on disk.
    pub fn as_raw(&self) -> &'a [u8] {
        self.data
    }

    /// Whether the section holds no tags.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Check whether a tag with the given two-character key is present.
    ///
    /// Scans tags in order, skipping each value by its declared size.
    /// Returns an error for unknown type codes or a section that ends
    /// mid-value.
    pub fn contains(&self, key: [u8; 2]) -> io::Result<bool> {
        let mut pos = 0;
        let data = self.data;

        while pos < data.len() {
            if pos + 3 > data.len() {
                return Err(BamDecodeError::Truncated {
                    context: "tag header",
                    expected: 3,
                    actual: data.len() - pos,
                }
                .into());
            }

            let tag = [data[pos], data[pos + 1]];
            let type_code = data[pos + 2];
            pos += 3;

            if tag == key {
                return Ok(true);
            }

            pos += value_size(data, pos, tag, type_code)?;
        }

        Ok(false)
    }
}

/// Size in bytes of a tag value starting at `pos`.
fn value_size(data: &[u8], pos: usize, tag: [u8; 2], type_code: u8) -> io::Result<usize> {
    let fixed = |n: usize| -> io::Result<usize> {
        if pos + n > data.len() {
            return Err(BamDecodeError::Truncated {
                context: "tag value",
                expected: n,
                actual: data.len() - pos,
            }
            .into());
        }
        Ok(n)
    };

    match type_code {
        b'A' | b'c' | b'C' => fixed(1),
        b's' | b'S' => fixed(2),
        b'i' | b'I' | b'f' => fixed(4),
        b'Z' | b'H' => {
            match data[pos..].iter().position(|&b| b == 0) {
                // Include the terminator
                Some(nul) => Ok(nul + 1),
                None => Err(BamDecodeError::MissingNulTerminator { field: "tag value" }.into()),
            }
        }
        b'B' => {
            if pos + 5 > data.len() {
                return Err(BamDecodeError::Truncated {
                    context: "tag array header",
                    expected: 5,
                    actual: data.len() - pos,
                }
                .into());
            }
            let subtype = data[pos];
            let count = u32::from_le_bytes([
                data[pos + 1],
                data[pos + 2],
                data[pos + 3],
                data[pos + 4],
            ]) as usize;
            let elem = match subtype {
                b'c' | b'C' => 1,
                b's' | b'S' => 2,
                b'i' | b'I' | b'f' => 4,
                _ => {
                    return Err(BamDecodeError::InvalidTagType {
                        tag,
                        type_code: subtype,
                    }
                    .into())
                }
            };
            let total = 5 + count
                .checked_mul(elem)
                .ok_or(BamDecodeError::Truncated {
                    context: "tag array",
                    expected: usize::MAX,
                    actual: data.len() - pos,
                })?;
            if pos + total > data.len() {
                return Err(BamDecodeError::Truncated {
                    context: "tag array",
                    expected: total,
                    actual: data.len() - pos,
                }
                .into());
            }
            Ok(total)
        }
        other => Err(BamDecodeError::InvalidTagType {
            tag,
            type_code: other,
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tags() {
        let tags = Tags::new(&[]);
        assert!(tags.is_empty());
        assert!(!tags.contains(*b"SA").unwrap());
    }

    #[test]
    fn test_first_tag_match() {
        // SA:Z:"chr1,100,+,50M50S,60,0;"
        let mut data = b"SAZ".to_vec();
        data.extend_from_slice(b"chr1,100,+,50M50S,60,0;\0");
        let tags = Tags::new(&data);
        assert!(tags.contains(*b"SA").unwrap());
        assert!(!tags.contains(*b"NM").unwrap());
    }

    #[test]
    fn test_skips_over_earlier_tags() {
        let mut data = Vec::new();
        // NM:i:3
        data.extend_from_slice(b"NMi");
        data.extend_from_slice(&3i32.to_le_bytes());
        // MD:Z:"100"
        data.extend_from_slice(b"MDZ100\0");
        // XB:B,S (3 elements)
        data.extend_from_slice(b"XBB");
        data.push(b'S');
        data.extend_from_slice(&3u32.to_le_bytes());
        data.extend_from_slice(&[1, 0, 2, 0, 3, 0]);
        // SA:Z last
        data.extend_from_slice(b"SAZchr2,5,+,10S90M,30,1;\0");

        let tags = Tags::new(&data);
        assert!(tags.contains(*b"SA").unwrap());
        assert!(tags.contains(*b"MD").unwrap());
        assert!(tags.contains(*b"XB").unwrap());
        assert!(!tags.contains(*b"RG").unwrap());
    }

    #[test]
    fn test_truncated_value_is_error() {
        // NM:i declared, only 2 of 4 value bytes present
        let data = b"NMi\x03\x00".to_vec();
        assert!(Tags::new(&data).contains(*b"SA").is_err());
    }

    #[test]
    fn test_unknown_type_code_is_error() {
        let data = b"XXq\x00".to_vec();
        assert!(Tags::new(&data).contains(*b"SA").is_err());
    }

    #[test]
    fn test_unterminated_string_is_error() {
        let data = b"MDZ100".to_vec();
        assert!(Tags::new(&data).contains(*b"SA").is_err());
    }
}
