//! BAM decoding error types.
//!
//! Structured errors for the record and header parsers. Variants carry the
//! offending value and, where useful, the byte offset inside the record so
//! a malformed input can be located without a hex dump.

use std::{error, fmt, io};

/// Errors that can occur while decoding BAM structures.
#[derive(Debug)]
pub enum BamDecodeError {
    /// I/O error occurred during reading
    Io(io::Error),

    /// Invalid BAM magic bytes
    InvalidMagic {
        /// The actual bytes found
        actual: [u8; 4],
    },

    /// Invalid read name length (must be >= 1)
    InvalidReadNameLength {
        /// The invalid length value
        length: u8,
    },

    /// Missing NUL terminator in a string field
    MissingNulTerminator {
        /// Which field was missing the terminator
        field: &'static str,
    },

    /// Invalid CIGAR operation code (must be 0-8)
    InvalidCigarOp {
        /// The packed 32-bit CIGAR word containing the invalid code
        value: u32,
    },

    /// Invalid auxiliary tag type code
    InvalidTagType {
        /// The tag name
        tag: [u8; 2],
        /// The invalid type code
        type_code: u8,
    },

    /// A length field was negative
    NegativeLength {
        /// Which field was negative
        field: &'static str,
        /// The negative value
        value: i32,
    },

    /// Record or section shorter than its declared size
    Truncated {
        /// What was being parsed
        context: &'static str,
        /// Expected number of bytes
        expected: usize,
        /// Actual number of bytes available
        actual: usize,
    },
}

impl error::Error for BamDecodeError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for BamDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {}", e),

            Self::InvalidMagic { actual } => {
                write!(f, "Invalid BAM magic: expected [BAM\\x01], got {:?}", actual)
            }

            Self::InvalidReadNameLength { length } => {
                write!(f, "Invalid read name length: {} (must be >= 1)", length)
            }

            Self::MissingNulTerminator { field } => {
                write!(f, "Missing NUL terminator in {}", field)
            }

            Self::InvalidCigarOp { value } => {
                write!(f, "Invalid CIGAR operation code in word {:#010x}", value)
            }

            Self::InvalidTagType { tag, type_code } => {
                write!(
                    f,
                    "Invalid type code {} for tag {}{}",
                    type_code, tag[0] as char, tag[1] as char
                )
            }

            Self::NegativeLength { field, value } => {
                write!(f, "Negative {}: {}", field, value)
            }

            Self::Truncated {
                context,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Truncated {}: expected {} bytes, got {}",
                    context, expected, actual
                )
            }
        }
    }
}

impl From<io::Error> for BamDecodeError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<BamDecodeError> for io::Error {
    fn from(e: BamDecodeError) -> Self {
        match e {
            BamDecodeError::Io(io_err) => io_err,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}
