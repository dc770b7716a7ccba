//! Operation reports

use crate::error::EntryError;

/// Outcome of collecting files into an archive.
#[derive(Debug, Default)]
pub struct ArchiveReport {
    /// Number of entries added
    pub entries_added: usize,
    /// Total bytes read from source files
    pub bytes_read: u64,
    /// Entries that were skipped, with the reason
    pub skipped: Vec<EntryError>,
}

impl ArchiveReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a skipped entry and log it
    pub fn skip(&mut self, err: EntryError) {
        log::warn!("skipped {}: {}", err.subject(), err);
        self.skipped.push(err);
    }

    pub fn has_skipped(&self) -> bool {
        !self.skipped.is_empty()
    }
}

/// Outcome of extracting an archive stream.
#[derive(Debug, Default)]
pub struct ExtractReport {
    /// Number of files written
    pub files_written: usize,
    /// Total bytes written
    pub bytes_written: u64,
    /// Records that were skipped, with the reason
    pub skipped: Vec<EntryError>,
}

impl ExtractReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a skipped record and log it
    pub fn skip(&mut self, err: EntryError) {
        log::warn!("skipped {}: {}", err.subject(), err);
        self.skipped.push(err);
    }

    pub fn has_skipped(&self) -> bool {
        !self.skipped.is_empty()
    }
}
