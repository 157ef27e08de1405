//! Shared helpers for integration tests: synthesize BAM byte images and
//! decode filter output.

// Not every test binary uses every helper.
#![allow(dead_code)]

use svsieve::io::bam::header::write_header;
use svsieve::{BamReader, CigarOp, Header, Reference};
use std::path::Path;

/// Build the raw on-disk bytes of one alignment record.
pub fn rec(name: &str, flags: u16, cigar: &[CigarOp], tags: &[u8]) -> Vec<u8> {
    let l_seq: u32 = cigar
        .iter()
        .filter(|op| op.consumes_query())
        .map(|op| op.length())
        .sum();

    let mut body = Vec::new();
    body.extend_from_slice(&0i32.to_le_bytes()); // refID
    body.extend_from_slice(&1000i32.to_le_bytes()); // pos
    body.push((name.len() + 1) as u8);
    body.push(60); // mapq
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
    body.extend(std::iter::repeat(0x11).take((l_seq as usize).div_ceil(2)));
    body.extend(std::iter::repeat(0xFF).take(l_seq as usize));
    body.extend_from_slice(tags);

    let mut data = (body.len() as i32).to_le_bytes().to_vec();
    data.extend_from_slice(&body);
    data
}

/// The header every synthetic input carries.
pub fn test_header() -> Header {
    Header::new(
        String::from("@HD\tVN:1.6\tSO:coordinate\n@SQ\tSN:chr1\tLN:248956422\n"),
        vec![Reference::new(String::from("chr1"), 248_956_422)],
    )
}

/// Assemble a plain (uncompressed) BAM byte image from raw records.
pub fn plain_bam(records: &[Vec<u8>]) -> Vec<u8> {
    let mut data = Vec::new();
    write_header(&mut data, &test_header()).unwrap();
    for record in records {
        data.extend_from_slice(record);
    }
    data
}

/// Read every record of an output BAM back as raw bytes.
pub fn read_records(path: &Path) -> Vec<Vec<u8>> {
    let mut reader = BamReader::from_path(path).unwrap();
    let mut out = Vec::new();
    while let Some(record) = reader.read_record().unwrap() {
        out.push(record.as_bytes().to_vec());
    }
    out
}

/// Read back just the record names.
pub fn read_names(path: &Path) -> Vec<String> {
    let mut reader = BamReader::from_path(path).unwrap();
    let mut out = Vec::new();
    while let Some(record) = reader.read_record().unwrap() {
        out.push(String::from_utf8(record.name().to_vec()).unwrap());
    }
    out
}
