//! Optional whole-stream compression
//!
//! Compression wraps the complete text stream, never individual records.
//! Gzip is the only codec; readers detect it from the magic bytes so plain
//! and compressed archives can be fed to the same entry points.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;

use flate2::bufread::MultiGzDecoder;
use flate2::write::GzEncoder;

/// Gzip member magic bytes
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Compression applied around an archive stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// Uncompressed text
    #[default]
    Plain,
    /// Gzip (deflate)
    Gzip,
}

impl Compression {
    /// Pick the codec from a file name (`.gz` selects gzip)
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("gz") => Self::Gzip,
            _ => Self::Plain,
        }
    }

    /// Detect the codec from the first bytes of a stream
    pub fn detect(prefix: &[u8]) -> Self {
        if prefix.starts_with(&GZIP_MAGIC) {
            Self::Gzip
        } else {
            Self::Plain
        }
    }

    /// Compress a complete stream
    pub fn compress(self, data: &[u8]) -> io::Result<Vec<u8>> {
        match self {
            Self::Plain => Ok(data.to_vec()),
            Self::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
                encoder.write_all(data)?;
                encoder.finish()
            }
        }
    }

    /// Decompress a complete stream
    pub fn decompress(self, data: &[u8]) -> io::Result<Vec<u8>> {
        match self {
            Self::Plain => Ok(data.to_vec()),
            Self::Gzip => {
                let mut out = Vec::new();
                MultiGzDecoder::new(data).read_to_end(&mut out)?;
                Ok(out)
            }
        }
    }

    /// Wrap a writer so everything written through it is compressed
    pub fn writer<W: Write>(self, inner: W) -> ArchiveWriter<W> {
        match self {
            Self::Plain => ArchiveWriter::Plain(inner),
            Self::Gzip => ArchiveWriter::Gzip(GzEncoder::new(inner, flate2::Compression::default())),
        }
    }
}

/// Writer returned by [`Compression::writer`]
///
/// [`ArchiveWriter::finish`] must be called to emit the gzip trailer.
pub enum ArchiveWriter<W: Write> {
    Plain(W),
    Gzip(GzEncoder<W>),
}

impl<W: Write> ArchiveWriter<W> {
    /// Flush all pending output and return the inner writer
    pub fn finish(self) -> io::Result<W> {
        match self {
            Self::Plain(mut inner) => {
                inner.flush()?;
                Ok(inner)
            }
            Self::Gzip(encoder) => {
                let mut inner = encoder.finish()?;
                inner.flush()?;
                Ok(inner)
            }
        }
    }
}

impl<W: Write> Write for ArchiveWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(inner) => inner.write(buf),
            Self::Gzip(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(inner) => inner.flush(),
            Self::Gzip(encoder) => encoder.flush(),
        }
    }
}

/// Sniff the first bytes of `reader` and return a reader yielding the plain
/// text stream
pub fn open_reader<'a, R: BufRead + 'a>(mut reader: R) -> io::Result<Box<dyn BufRead + 'a>> {
    // A single fill_buf may hold fewer bytes than the magic
    let mut head = Vec::with_capacity(GZIP_MAGIC.len());
    while head.len() < GZIP_MAGIC.len() {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            break;
        }
        let take = buf.len().min(GZIP_MAGIC.len() - head.len());
        head.extend_from_slice(&buf[..take]);
        reader.consume(take);
    }

    let codec = Compression::detect(&head);
    log::debug!("archive stream compression: {:?}", codec);

    let stream = io::Cursor::new(head).chain(reader);
    Ok(match codec {
        Compression::Plain => Box::new(stream),
        Compression::Gzip => Box::new(BufReader::new(MultiGzDecoder::new(stream))),
    })
}
