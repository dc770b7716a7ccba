//! Archive encoder

use std::io::{BufWriter, Write};
use std::path::Path;

use crate::archive::{Archive, Entry, MARKER_PREFIX, MARKER_SUFFIX};
use crate::codec;
use crate::compression::Compression;
use crate::error::Result;

/// Encodes an archive into the digit-string text format
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    compression: Compression,
}

impl Encoder {
    /// Create a new encoder producing plain text
    pub fn new() -> Self {
        Self::default()
    }

    /// Compress output written by [`Encoder::encode_to_writer`] and
    /// [`Encoder::encode_to_file`]
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Encode an archive to a string
    pub fn encode(&self, archive: &Archive) -> String {
        let capacity: usize = archive.iter().map(record_len).sum();
        let mut output = String::with_capacity(capacity);

        for entry in archive {
            self.encode_entry(&mut output, entry);
        }

        output
    }

    /// Encode a single entry as one record
    pub fn encode_entry(&self, output: &mut String, entry: &Entry) {
        output.push_str(MARKER_PREFIX);
        output.push_str(&entry.path);
        output.push_str(MARKER_SUFFIX);
        output.push('\n');
        codec::encode_into(&entry.content, output);
        output.push_str("\n\n");
    }

    /// Encode an archive directly to a writer, one record at a time
    pub fn encode_to_writer<W: Write>(&self, archive: &Archive, writer: W) -> Result<()> {
        let mut writer = self.compression.writer(writer);
        let mut record = String::new();

        for entry in archive {
            record.clear();
            self.encode_entry(&mut record, entry);
            writer.write_all(record.as_bytes())?;
            log::debug!("encoded {} ({} bytes)", entry.path, entry.content.len());
        }

        writer.finish()?;
        Ok(())
    }

    /// Encode an archive to a file
    ///
    /// A `.gz` file name selects gzip even when the encoder is plain.
    pub fn encode_to_file(&self, archive: &Archive, path: &Path) -> Result<()> {
        let encoder = match Compression::from_path(path) {
            Compression::Gzip => self.clone().with_compression(Compression::Gzip),
            Compression::Plain => self.clone(),
        };

        let file = std::fs::File::create(path)?;
        encoder.encode_to_writer(archive, BufWriter::new(file))
    }
}

/// Exact encoded length of one record
fn record_len(entry: &Entry) -> usize {
    MARKER_PREFIX.len()
        + entry.path.len()
        + MARKER_SUFFIX.len()
        + 1
        + entry.content.len() * codec::DIGITS_PER_BYTE
        + 2
}
