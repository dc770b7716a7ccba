//! Archive decoder
//!
//! Records are read one at a time from a [`BufRead`]; only the record being
//! decoded is held in memory.

use std::collections::HashSet;
use std::fs;
use std::io::{self, BufRead};
use std::iter::FusedIterator;
use std::path::Path;

use crate::archive::{normalize_path, Archive, Entry, MARKER_PREFIX, MARKER_PREFIX_LEN, MARKER_SUFFIX};
use crate::codec;
use crate::compression;
use crate::error::{EntryError, Error, Result};
use crate::report::ExtractReport;

/// Decodes archive streams
#[derive(Debug, Clone, Default)]
pub struct Decoder;

impl Decoder {
    /// Create a new decoder
    pub fn new() -> Self {
        Self
    }

    /// Lazily parse records from a plain text stream
    ///
    /// Per-record failures are yielded as recoverable errors and iteration
    /// continues; a read failure of `reader` is yielded once and ends it.
    pub fn records<R: BufRead>(&self, reader: R) -> Records<R> {
        Records::new(reader)
    }

    /// Decode a complete in-memory stream into an archive
    ///
    /// Returns the archive together with the records that were skipped.
    pub fn decode(&self, input: &str) -> Result<(Archive, Vec<EntryError>)> {
        let mut archive = Archive::new();
        let mut skipped = Vec::new();

        for item in self.records(input.as_bytes()) {
            let result = match item {
                Ok(entry) => archive.add_entry(entry),
                Err(Error::Entry(err)) => Err(err),
                Err(err) => return Err(err),
            };
            if let Err(err) = result {
                log::warn!("skipped {}: {}", err.subject(), err);
                skipped.push(err);
            }
        }

        Ok((archive, skipped))
    }

    /// Extract a stream into `dest`, writing each file as its record is
    /// decoded
    ///
    /// Gzip input is detected and decompressed transparently. Existing files
    /// are overwritten. Only failures to read the stream or to create `dest`
    /// are returned as errors; everything else lands in the report.
    pub fn extract<R: BufRead>(&self, reader: R, dest: &Path) -> Result<ExtractReport> {
        let reader = compression::open_reader(reader)?;
        fs::create_dir_all(dest)?;

        let mut report = ExtractReport::new();
        let mut seen = HashSet::new();

        for item in self.records(reader) {
            let entry = match item {
                Ok(entry) => entry,
                Err(Error::Entry(err)) => {
                    report.skip(err);
                    continue;
                }
                Err(err) => return Err(err),
            };

            if !seen.insert(entry.path.clone()) {
                log::warn!("duplicate path {}, overwriting", entry.path);
            }

            let target = dest.join(&entry.path);
            match write_file(&target, &entry.content) {
                Ok(()) => {
                    log::debug!("extracted {} ({} bytes)", entry.path, entry.content.len());
                    report.files_written += 1;
                    report.bytes_written += entry.content.len() as u64;
                }
                Err(source) => report.skip(EntryError::WriteFailure { path: target, source }),
            }
        }

        Ok(report)
    }
}

/// Create missing parent directories and write the file
fn write_file(target: &Path, content: &[u8]) -> io::Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(target, content)
}

/// Header line plus the raw body lines that followed it
struct RawRecord {
    header: Vec<u8>,
    body: Vec<u8>,
}

/// Iterator over the entries of a stream, see [`Decoder::records`]
pub struct Records<R> {
    reader: R,
    line: Vec<u8>,
    /// Input from a marker onwards, found while scanning the previous record
    pending: Option<Vec<u8>>,
    done: bool,
}

impl<R: BufRead> Records<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::new(),
            pending: None,
            done: false,
        }
    }

    /// Read the next line into `self.line`; `false` at end of input
    fn read_line(&mut self) -> io::Result<bool> {
        self.line.clear();
        Ok(self.reader.read_until(b'\n', &mut self.line)? > 0)
    }

    fn next_raw(&mut self) -> io::Result<Option<RawRecord>> {
        let mut chunk = match self.pending.take() {
            Some(chunk) => chunk,
            None => loop {
                if !self.read_line()? {
                    return Ok(None);
                }
                if let Some(pos) = find_marker(&self.line) {
                    if pos > 0 {
                        log::debug!("ignoring {} bytes before the first record", pos);
                    }
                    break self.line.split_off(pos);
                }
                if !self.line.trim_ascii().is_empty() {
                    log::debug!("ignoring {} bytes before the first record", self.line.len());
                }
            },
        };

        // A second marker on the header line starts the next record
        if let Some(pos) = find_marker(&chunk[MARKER_PREFIX_LEN..]) {
            self.pending = Some(chunk.split_off(MARKER_PREFIX_LEN + pos));
            return Ok(Some(RawRecord {
                header: chunk,
                body: Vec::new(),
            }));
        }

        let mut body = Vec::new();
        while self.read_line()? {
            if let Some(pos) = find_marker(&self.line) {
                body.extend_from_slice(&self.line[..pos]);
                self.pending = Some(self.line.split_off(pos));
                break;
            }
            body.extend_from_slice(&self.line);
        }

        Ok(Some(RawRecord { header: chunk, body }))
    }
}

impl<R: BufRead> Iterator for Records<R> {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.next_raw() {
            Ok(Some(raw)) => Some(parse_record(raw).map_err(Error::from)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(Error::Io(err)))
            }
        }
    }
}

impl<R: BufRead> FusedIterator for Records<R> {}

/// Offset of the first record marker in `buf`
fn find_marker(buf: &[u8]) -> Option<usize> {
    buf.windows(MARKER_PREFIX_LEN)
        .position(|window| window == MARKER_PREFIX.as_bytes())
}

fn malformed(header: &[u8], reason: &'static str) -> EntryError {
    EntryError::MalformedRecord {
        header: String::from_utf8_lossy(header).trim_end().to_string(),
        reason,
    }
}

/// Turn one raw record into an entry
fn parse_record(raw: RawRecord) -> std::result::Result<Entry, EntryError> {
    let RawRecord { header, body } = raw;

    let Some(line) = header.strip_suffix(b"\n") else {
        return Err(malformed(&header, "header not terminated by a line break"));
    };
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    let line = std::str::from_utf8(line).map_err(|_| malformed(line, "header is not valid UTF-8"))?;

    let raw_path = line[MARKER_PREFIX_LEN..]
        .strip_suffix(MARKER_SUFFIX)
        .ok_or_else(|| malformed(line.as_bytes(), "missing ' ---' suffix"))?;
    let path = normalize_path(raw_path)?;

    let content = codec::decode_bytes(body.trim_ascii()).map_err(|source| {
        EntryError::MalformedEncoding {
            path: path.clone(),
            source,
        }
    })?;

    Ok(Entry::new(path, content))
}
