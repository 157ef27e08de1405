//! BAM header reading and writing.
//!
//! The filter copies the input header to the output verbatim before any
//! record is written, so this module carries both directions of the same
//! structure:
//!
//! ```text
//! BAM Header:
//! - 4 bytes: Magic ("BAM\1")
//! - 4 bytes: SAM header text length (l_text, int32)
//! - l_text bytes: SAM header text
//! - 4 bytes: Number of reference sequences (n_ref, int32)
//! - For each reference:
//!   - 4 bytes: name length (l_name, int32, includes NUL)
//!   - l_name bytes: name (NUL-terminated)
//!   - 4 bytes: sequence length (int32)
//! ```

use super::error::BamDecodeError;
use std::io::{self, Read, Write};

/// BAM magic bytes.
const BAM_MAGIC: &[u8; 4] = b"BAM\x01";

/// Reference sequence information (name and length of one contig).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Reference sequence name (e.g., "chr1")
    pub name: String,
    /// Reference sequence length in bases
    pub length: u32,
}

impl Reference {
    /// Create a new reference.
    pub fn new(name: String, length: u32) -> Self {
        Self { name, length }
    }
}

/// BAM file header: SAM header text plus the reference dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// SAM header text (@HD, @SQ, @RG, @PG lines)
    pub text: String,
    /// Reference sequences
    pub references: Vec<Reference>,
}

impl Header {
    /// Create a new header.
    pub fn new(text: String, references: Vec<Reference>) -> Self {
        Self { text, references }
    }

    /// Number of reference sequences.
    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    /// Reference name by ID, `None` when out of bounds.
    pub fn reference_name(&self, id: usize) -> Option<&str> {
        self.references.get(id).map(|r| r.name.as_str())
    }
}

/// Read and validate the BAM magic bytes.
pub fn read_magic<R: Read>(reader: &mut R) -> io::Result<()> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if &magic != BAM_MAGIC {
        return Err(BamDecodeError::InvalidMagic { actual: magic }.into());
    }
    Ok(())
}

fn read_i32<R: Read>(reader: &mut R) -> io::Result<i32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

fn read_header_text<R: Read>(reader: &mut R) -> io::Result<String> {
    let len = read_i32(reader)?;
    if len < 0 {
        return Err(BamDecodeError::NegativeLength {
            field: "SAM header length",
            value: len,
        }
        .into());
    }

    let mut text_bytes = vec![0u8; len as usize];
    reader.read_exact(&mut text_bytes)?;

    String::from_utf8(text_bytes).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Invalid UTF-8 in SAM header: {}", e),
        )
    })
}

fn read_reference<R: Read>(reader: &mut R) -> io::Result<Reference> {
    let name_len = read_i32(reader)?;
    if name_len <= 0 {
        return Err(BamDecodeError::NegativeLength {
            field: "reference name length",
            value: name_len,
        }
        .into());
    }

    let mut name_bytes = vec![0u8; name_len as usize];
    reader.read_exact(&mut name_bytes)?;

    if name_bytes.pop() != Some(0) {
        return Err(BamDecodeError::MissingNulTerminator {
            field: "reference name",
        }
        .into());
    }

    let name = String::from_utf8(name_bytes).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Invalid UTF-8 in reference name: {}", e),
        )
    })?;

    let length = read_i32(reader)?;
    if length < 0 {
        return Err(BamDecodeError::NegativeLength {
            field: "reference length",
            value: length,
        }
        .into());
    }

    Ok(Reference::new(name, length as u32))
}

/// Read a complete BAM header: magic, SAM text, and reference dictionary.
pub fn read_header<R: Read>(reader: &mut R) -> io::Result<Header> {
    read_magic(reader)?;
    let text = read_header_text(reader)?;

    let count = read_i32(reader)?;
    if count < 0 {
        return Err(BamDecodeError::NegativeLength {
            field: "reference count",
            value: count,
        }
        .into());
    }

    let mut references = Vec::with_capacity(count as usize);
    for _ in 0..count {
        references.push(read_reference(reader)?);
    }

    Ok(Header::new(text, references))
}

/// Write a complete BAM header, the mirror of [`read_header`].
///
/// A header read and written back produces identical bytes.
pub fn write_header<W: Write>(writer: &mut W, header: &Header) -> io::Result<()> {
    writer.write_all(BAM_MAGIC)?;

    writer.write_all(&(header.text.len() as i32).to_le_bytes())?;
    writer.write_all(header.text.as_bytes())?;

    writer.write_all(&(header.references.len() as i32).to_le_bytes())?;
    for reference in &header.references {
        writer.write_all(&((reference.name.len() + 1) as i32).to_le_bytes())?;
        writer.write_all(reference.name.as_bytes())?;
        writer.write_all(&[0])?;
        writer.write_all(&(reference.length as i32).to_le_bytes())?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_header() -> Header {
        Header::new(
            String::from("@HD\tVN:1.6\tSO:coordinate\n@SQ\tSN:chr1\tLN:1000\n"),
            vec![
                Reference::new(String::from("chr1"), 1000),
                Reference::new(String::from("chr2"), 2000),
            ],
        )
    }

    #[test]
    fn test_read_magic_invalid() {
        let mut cursor = Cursor::new(b"BAMX".to_vec());
        assert!(read_magic(&mut cursor).is_err());
    }

    #[test]
    fn test_write_read_roundtrip() {
        let header = sample_header();
        let mut buf = Vec::new();
        write_header(&mut buf, &header).unwrap();

        let parsed = read_header(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_rewrite_is_byte_identical() {
        let header = sample_header();
        let mut first = Vec::new();
        write_header(&mut first, &header).unwrap();

        let reread = read_header(&mut Cursor::new(&first)).unwrap();
        let mut second = Vec::new();
        write_header(&mut second, &reread).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_reference_lookup() {
        let header = sample_header();
        assert_eq!(header.reference_count(), 2);
        assert_eq!(header.reference_name(1), Some("chr2"));
        assert_eq!(header.reference_name(2), None);
    }

    #[test]
    fn test_empty_header() {
        let header = Header::new(String::new(), Vec::new());
        let mut buf = Vec::new();
        write_header(&mut buf, &header).unwrap();
        let parsed = read_header(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(parsed.text, "");
        assert_eq!(parsed.reference_count(), 0);
    }
}
