//! Transparent decompression for input files.
//!
//! Codecs are detected from the file extension first, then from magic bytes,
//! and plain text is the fallback. Gzip (`.gz`, `.gzip`) is built in via
//! `flate2`.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Compression codec.
///
/// Implementations are stateless and shared between workers.
pub trait CompressionCodec: Send + Sync {
    /// Human-readable codec name (e.g., "gzip").
    fn name(&self) -> &str;

    /// File extensions associated with this codec, lowercase with the leading dot.
    fn extensions(&self) -> &[&str];

    /// Optional magic byte signature for content-based detection.
    fn magic_bytes(&self) -> Option<&[u8]>;

    fn wrap_reader_dyn(&self, reader: Box<dyn Read + Send>) -> io::Result<Box<dyn Read + Send>>;

    fn wrap_writer_dyn(&self, writer: Box<dyn Write + Send>) -> io::Result<Box<dyn Write + Send>>;
}

struct GzipCodec;

impl CompressionCodec for GzipCodec {
    fn name(&self) -> &str {
        "gzip"
    }

    fn extensions(&self) -> &[&str] {
        &[".gz", ".gzip"]
    }

    fn magic_bytes(&self) -> Option<&[u8]> {
        Some(&[0x1f, 0x8b])
    }

    fn wrap_reader_dyn(&self, reader: Box<dyn Read + Send>) -> io::Result<Box<dyn Read + Send>> {
        use flate2::read::MultiGzDecoder;
        Ok(Box::new(MultiGzDecoder::new(reader)))
    }

    fn wrap_writer_dyn(&self, writer: Box<dyn Write + Send>) -> io::Result<Box<dyn Write + Send>> {
        use flate2::Compression;
        use flate2::write::GzEncoder;
        Ok(Box::new(GzEncoder::new(writer, Compression::default())))
    }
}

static CODECS: [&(dyn CompressionCodec); 1] = [&GzipCodec];

fn detect_from_extension(path: &Path) -> Option<&'static dyn CompressionCodec> {
    let path_str = path.to_string_lossy().to_lowercase();
    CODECS
        .iter()
        .copied()
        .find(|codec| codec.extensions().iter().any(|ext| path_str.ends_with(ext)))
}

/// Peeks at the buffered reader without advancing it.
fn detect_from_magic<R: BufRead>(reader: &mut R) -> Option<&'static dyn CompressionCodec> {
    let buf = reader.fill_buf().ok()?;
    if buf.is_empty() {
        return None;
    }
    CODECS.iter().copied().find(|codec| {
        codec
            .magic_bytes()
            .is_some_and(|magic| buf.len() >= magic.len() && buf.starts_with(magic))
    })
}

/// Wrap `reader` with decompression chosen by `path_hint`, then by magic bytes.
pub fn auto_detect_reader<R: Read + Send + 'static>(
    reader: R,
    path_hint: impl AsRef<Path>,
) -> io::Result<Box<dyn Read + Send>> {
    if let Some(codec) = detect_from_extension(path_hint.as_ref()) {
        return codec.wrap_reader_dyn(Box::new(reader));
    }

    let mut buf_reader = BufReader::new(reader);
    if let Some(codec) = detect_from_magic(&mut buf_reader) {
        return codec.wrap_reader_dyn(Box::new(buf_reader));
    }

    Ok(Box::new(buf_reader))
}

/// Wrap `writer` with compression chosen by the extension of `path_hint`.
pub fn auto_detect_writer<W: Write + Send + 'static>(
    writer: W,
    path_hint: impl AsRef<Path>,
) -> Result<Box<dyn Write + Send>> {
    if let Some(codec) = detect_from_extension(path_hint.as_ref()) {
        return codec
            .wrap_writer_dyn(Box::new(writer))
            .with_context(|| format!("wrap writer with {} codec", codec.name()));
    }
    Ok(Box::new(BufWriter::new(writer)))
}

/// Open `path` as a buffered, decompressed text stream.
///
/// The first block is decoded before returning, so a missing file, a corrupt
/// header, or an unreadable stream all fail here rather than mid-iteration.
///
/// # Errors
///
/// The underlying `io::Error` from opening the file or decoding its first
/// block.
pub fn open_text(path: &Path) -> io::Result<Box<dyn BufRead + Send>> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(auto_detect_reader(file, path)?);
    reader.fill_buf()?;
    Ok(Box::new(reader))
}
