//! BGZF transport: block framing, parallel decode, single-threaded encode.
//!
//! BAM files are BGZF-compressed: a sequence of independent gzip members,
//! each carrying a `BC` extra subfield whose BSIZE value frames the block.
//! Independence is what makes decode parallelism possible, so the reader
//! decompresses a bounded chunk of blocks at a time on an optional dedicated
//! worker pool, while the writer always compresses sequentially (the encode
//! side of the pipeline is pinned to one thread).
//!
//! Plain uncompressed BAM is supported by passing the stream through when
//! the gzip magic is absent.

use crate::error::{Result, SvsieveError};
use flate2::read::GzDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use memmap2::Mmap;
use rayon::prelude::*;
use rayon::ThreadPool;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;

/// File size at which the reader switches from buffered I/O to mmap.
pub const MMAP_THRESHOLD: u64 = 50 * 1024 * 1024; // 50 MB

/// Number of BGZF blocks decompressed per chunk.
///
/// Memory bound per chunk: compressed + decompressed blocks at the BGZF
/// 64 KB per-block ceiling, ~1 MB total regardless of file size.
pub const DECODE_CHUNK_BLOCKS: usize = 8;

/// Maximum uncompressed payload per written block.
///
/// The BGZF spec caps each block at 64 KB uncompressed; 60 KB leaves
/// headroom so the compressed member stays under the u16 BSIZE limit.
const BGZF_BLOCK_SIZE: usize = 60 * 1024;

/// Standard 28-byte BGZF EOF marker (an empty block).
const BGZF_EOF: [u8; 28] = [
    31, 139, 8, 4, 0, 0, 0, 0, 0, 255, // gzip header
    6, 0, 66, 67, 2, 0, 27, 0, // BC extra subfield, BSIZE=27
    3, 0, // empty deflate block
    0, 0, 0, 0, // CRC32
    0, 0, 0, 0, // ISIZE
];

/// Open a local file for reading, using mmap above [`MMAP_THRESHOLD`].
pub fn open_input(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    let metadata = std::fs::metadata(path)?;

    if metadata.len() >= MMAP_THRESHOLD {
        open_mmap_file(path)
    } else {
        let file = File::open(path)?;
        Ok(Box::new(BufReader::new(file)))
    }
}

#[cfg(target_os = "macos")]
fn open_mmap_file(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    use libc::{madvise, MADV_SEQUENTIAL, MADV_WILLNEED};

    let file = File::open(path)?;
    let mmap = unsafe { Mmap::map(&file)? };

    // Sequential access hints for the page cache
    unsafe {
        madvise(
            mmap.as_ptr() as *mut _,
            mmap.len(),
            MADV_SEQUENTIAL | MADV_WILLNEED,
        );
    }

    Ok(Box::new(io::Cursor::new(mmap)))
}

#[cfg(not(target_os = "macos"))]
fn open_mmap_file(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    let file = File::open(path)?;
    let mmap = unsafe { Mmap::map(&file)? };
    Ok(Box::new(io::Cursor::new(mmap)))
}

/// Open a path as a decoded BAM byte stream.
///
/// Detects BGZF/gzip by magic; uncompressed input passes through.
/// `decode_workers` extra threads serve block decompression (0 decodes
/// inline on the calling thread).
pub fn open_decoded(path: &Path, decode_workers: usize) -> Result<Box<dyn BufRead + Send>> {
    let mut reader = open_input(path)?;

    let is_gzipped = {
        let peeked = reader.fill_buf()?;
        peeked.len() >= 2 && peeked[0] == 31 && peeked[1] == 139
    };

    if is_gzipped {
        let bgzf = BgzfReader::with_workers(reader, decode_workers)?;
        Ok(Box::new(BufReader::new(bgzf)))
    } else {
        Ok(reader)
    }
}

/// One compressed BGZF block.
struct BgzfBlock {
    data: Vec<u8>,
}

/// Decompress a single block.
fn decompress_block(block: &BgzfBlock) -> io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(&block.data[..]);
    let mut decompressed = Vec::new();
    decoder.read_to_end(&mut decompressed)?;
    Ok(decompressed)
}

/// Streaming BGZF reader with bounded chunked decode.
///
/// Reads [`DECODE_CHUNK_BLOCKS`] blocks, decompresses them (in parallel on
/// the dedicated pool when one was requested), buffers the concatenated
/// output, and yields it through [`Read`]. Memory stays bounded at roughly
/// one chunk regardless of input size.
pub struct BgzfReader<R: BufRead> {
    inner: R,
    pool: Option<ThreadPool>,
    output_buffer: Vec<u8>,
    output_pos: usize,
    eof: bool,
}

impl<R: BufRead> BgzfReader<R> {
    /// Create a reader that decompresses inline on the calling thread.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            pool: None,
            output_buffer: Vec::new(),
            output_pos: 0,
            eof: false,
        }
    }

    /// Create a reader with `workers` dedicated decode threads.
    ///
    /// `workers == 0` is equivalent to [`BgzfReader::new`].
    pub fn with_workers(inner: R, workers: usize) -> Result<Self> {
        let pool = if workers == 0 {
            None
        } else {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .build()
                    .map_err(|e| SvsieveError::ThreadPool(e.to_string()))?,
            )
        };
        Ok(Self {
            inner,
            pool,
            output_buffer: Vec::new(),
            output_pos: 0,
            eof: false,
        })
    }

    /// Read one BGZF block from the stream, framed by its BSIZE field.
    fn read_one_block(&mut self) -> io::Result<Option<BgzfBlock>> {
        let mut header = [0u8; 18];
        match self.inner.read_exact(&mut header) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e),
        }

        if header[0] != 31 || header[1] != 139 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid gzip magic: [{}, {}]", header[0], header[1]),
            ));
        }

        // FEXTRA must be set for a framed BGZF member; without it, fall
        // back to treating the rest of the stream as one gzip member.
        if header[3] & 0x04 == 0 {
            let mut compressed = header.to_vec();
            self.inner.read_to_end(&mut compressed)?;
            return Ok(Some(BgzfBlock { data: compressed }));
        }

        let xlen = u16::from_le_bytes([header[10], header[11]]) as usize;
        let mut extra = vec![0u8; xlen];
        self.inner.read_exact(&mut extra)?;

        // Scan extra subfields for BC/BSIZE
        let mut bsize: Option<u16> = None;
        let mut pos = 0;
        while pos + 4 <= xlen {
            let si1 = extra[pos];
            let si2 = extra[pos + 1];
            let slen = u16::from_le_bytes([extra[pos + 2], extra[pos + 3]]) as usize;

            if si1 == 66 && si2 == 67 && slen == 2 {
                if pos + 6 > xlen {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        "Incomplete BSIZE field",
                    ));
                }
                bsize = Some(u16::from_le_bytes([extra[pos + 4], extra[pos + 5]]));
                break;
            }
            pos += 4 + slen;
        }

        let block_size = match bsize {
            Some(bs) => bs as usize + 1,
            None => {
                let mut compressed = header.to_vec();
                compressed.extend_from_slice(&extra);
                self.inner.read_to_end(&mut compressed)?;
                return Ok(Some(BgzfBlock { data: compressed }));
            }
        };

        let already_read = 18 + xlen;
        if block_size < already_read {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid BGZF block size: {}", block_size),
            ));
        }

        let mut block_data = Vec::with_capacity(block_size);
        block_data.extend_from_slice(&header);
        block_data.extend_from_slice(&extra);

        let mut rest = vec![0u8; block_size - already_read];
        self.inner.read_exact(&mut rest)?;
        block_data.extend_from_slice(&rest);

        Ok(Some(BgzfBlock { data: block_data }))
    }

    /// Read and decompress the next chunk of blocks.
    fn read_next_chunk(&mut self) -> io::Result<()> {
        if self.eof {
            return Ok(());
        }

        let mut blocks = Vec::with_capacity(DECODE_CHUNK_BLOCKS);
        for _ in 0..DECODE_CHUNK_BLOCKS {
            match self.read_one_block()? {
                Some(block) => blocks.push(block),
                None => {
                    self.eof = true;
                    break;
                }
            }
        }

        if blocks.is_empty() {
            return Ok(());
        }

        let decompressed: Vec<Vec<u8>> = match &self.pool {
            Some(pool) => pool.install(|| {
                blocks
                    .par_iter()
                    .map(decompress_block)
                    .collect::<io::Result<_>>()
            })?,
            None => blocks
                .iter()
                .map(decompress_block)
                .collect::<io::Result<_>>()?,
        };

        self.output_buffer.clear();
        for block_data in &decompressed {
            self.output_buffer.extend_from_slice(block_data);
        }
        self.output_pos = 0;

        Ok(())
    }
}

impl<R: BufRead> Read for BgzfReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.output_pos >= self.output_buffer.len() {
            if self.eof {
                return Ok(0);
            }
            self.read_next_chunk()?;
            if self.output_buffer.is_empty() {
                return Ok(0);
            }
        }

        let available = self.output_buffer.len() - self.output_pos;
        let to_copy = available.min(buf.len());
        buf[..to_copy]
            .copy_from_slice(&self.output_buffer[self.output_pos..self.output_pos + to_copy]);
        self.output_pos += to_copy;

        Ok(to_copy)
    }
}

/// Streaming BGZF writer, sequential encode.
///
/// Buffers payload into [`BGZF_BLOCK_SIZE`] blocks, deflates each with its
/// BGZF framing, and appends the standard EOF marker on [`finish`].
/// Dropping a writer without calling `finish` leaves the output without an
/// EOF marker; `finish` must be called and its error handled.
///
/// [`finish`]: BgzfWriter::finish
pub struct BgzfWriter<W: Write> {
    writer: W,
    current_block: Vec<u8>,
}

impl<W: Write> BgzfWriter<W> {
    /// Create a writer over any byte sink.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            current_block: Vec::with_capacity(BGZF_BLOCK_SIZE),
        }
    }

    /// Compress one payload into a complete BGZF member.
    fn compress_block(data: &[u8]) -> io::Result<Vec<u8>> {
        let mut deflate = DeflateEncoder::new(Vec::new(), Compression::fast());
        deflate.write_all(data)?;
        let deflated = deflate.finish()?;

        let crc = crc32fast::hash(data);

        let mut block = Vec::with_capacity(deflated.len() + 26);
        block.push(31); // ID1
        block.push(139); // ID2
        block.push(8); // CM (deflate)
        block.push(4); // FLG (FEXTRA)
        block.extend_from_slice(&[0, 0, 0, 0]); // MTIME
        block.push(0); // XFL
        block.push(255); // OS (unknown)
        block.extend_from_slice(&6u16.to_le_bytes()); // XLEN
        block.push(66); // SI1 'B'
        block.push(67); // SI2 'C'
        block.extend_from_slice(&2u16.to_le_bytes()); // SLEN

        let bsize_pos = block.len();
        block.extend_from_slice(&0u16.to_le_bytes()); // BSIZE placeholder

        block.extend_from_slice(&deflated);
        block.extend_from_slice(&crc.to_le_bytes());
        block.extend_from_slice(&(data.len() as u32).to_le_bytes());

        let bsize = (block.len() - 1) as u16;
        block[bsize_pos..bsize_pos + 2].copy_from_slice(&bsize.to_le_bytes());

        Ok(block)
    }

    fn write_current_block(&mut self) -> io::Result<()> {
        if self.current_block.is_empty() {
            return Ok(());
        }
        let block = Self::compress_block(&self.current_block)?;
        self.writer.write_all(&block)?;
        self.current_block.clear();
        Ok(())
    }

    /// Flush buffered payload and append the BGZF EOF marker.
    ///
    /// Returns the underlying sink so in-memory callers can recover the
    /// written bytes.
    pub fn finish(mut self) -> io::Result<W> {
        self.write_current_block()?;
        self.writer.write_all(&BGZF_EOF)?;
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> Write for BgzfWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut remaining = buf;
        while !remaining.is_empty() {
            let space = BGZF_BLOCK_SIZE - self.current_block.len();
            let to_copy = remaining.len().min(space);
            self.current_block.extend_from_slice(&remaining[..to_copy]);
            remaining = &remaining[to_copy..];

            if self.current_block.len() >= BGZF_BLOCK_SIZE {
                self.write_current_block()?;
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn roundtrip(payload: &[u8], workers: usize) -> Vec<u8> {
        let mut writer = BgzfWriter::new(Vec::new());
        writer.write_all(payload).unwrap();
        let compressed = writer.finish().unwrap();

        let mut reader =
            BgzfReader::with_workers(Cursor::new(compressed), workers).unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn test_roundtrip_small() {
        let payload = b"BAM\x01 not really, just bytes".to_vec();
        assert_eq!(roundtrip(&payload, 0), payload);
    }

    #[test]
    fn test_roundtrip_multiblock() {
        // Spans several 60 KB blocks and several decode chunks
        let payload: Vec<u8> = (0..2_000_000u32).map(|i| (i % 251) as u8).collect();
        assert_eq!(roundtrip(&payload, 0), payload);
        assert_eq!(roundtrip(&payload, 2), payload);
    }

    #[test]
    fn test_empty_payload_is_just_eof_marker() {
        let writer = BgzfWriter::new(Vec::new());
        let compressed = writer.finish().unwrap();
        assert_eq!(compressed.len(), 28);
        assert_eq!(compressed, BGZF_EOF);
    }

    #[test]
    fn test_eof_marker_terminates_stream() {
        let mut writer = BgzfWriter::new(Vec::new());
        writer.write_all(b"payload").unwrap();
        let compressed = writer.finish().unwrap();
        assert_eq!(&compressed[compressed.len() - 28..], &BGZF_EOF);

        let mut reader = BgzfReader::new(Cursor::new(compressed));
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"payload");
    }

    #[test]
    fn test_invalid_magic_rejected() {
        let mut reader = BgzfReader::new(Cursor::new(vec![0u8; 32]));
        let mut out = Vec::new();
        assert!(reader.read_to_end(&mut out).is_err());
    }
}
