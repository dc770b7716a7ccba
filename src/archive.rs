//! Archive data structures

use std::collections::HashSet;
use std::path::Path;

use crate::error::EntryError;

// Record framing constants
pub const MARKER_PREFIX: &str = "--- ";
pub const MARKER_SUFFIX: &str = " ---";
pub const MARKER_PREFIX_LEN: usize = 4; // len("--- ")
pub const MARKER_SUFFIX_LEN: usize = 4; // len(" ---")

/// A single archived file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Relative path, `/`-separated
    pub path: String,
    /// Raw file contents
    pub content: Vec<u8>,
}

impl Entry {
    /// Create a new entry with the given path and content
    pub fn new(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Formatted header line (without the trailing newline)
    pub fn header(&self) -> String {
        format!("{}{}{}", MARKER_PREFIX, self.path, MARKER_SUFFIX)
    }
}

/// Normalize an entry path and reject anything that could leave the
/// destination root.
///
/// Empty and `.` segments are dropped; the result is joined with `/`.
///
/// ```
/// use digitar::archive::normalize_path;
///
/// assert_eq!(normalize_path("./src//main.rs").unwrap(), "src/main.rs");
/// assert!(normalize_path("../etc/passwd").is_err());
/// assert!(normalize_path("/etc/passwd").is_err());
/// ```
pub fn normalize_path(raw: &str) -> Result<String, EntryError> {
    if raw.contains('\0') {
        return Err(EntryError::InvalidPath {
            path: raw.to_string(),
            reason: "contains a NUL byte",
        });
    }

    if raw.starts_with('/') || raw.starts_with('\\') || has_drive_prefix(raw) {
        return Err(EntryError::PathEscape { path: raw.to_string() });
    }

    let mut segments = Vec::new();
    for segment in raw.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        // A backslash is a separator on some platforms
        if segment.split('\\').any(|part| part == "..") {
            return Err(EntryError::PathEscape { path: raw.to_string() });
        }
        segments.push(segment);
    }

    if segments.is_empty() {
        return Err(EntryError::InvalidPath {
            path: raw.to_string(),
            reason: "empty path",
        });
    }

    Ok(segments.join("/"))
}

/// Check for a Windows drive prefix such as `C:`
fn has_drive_prefix(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Check that a normalized path can be carried by the record framing
fn check_framable(path: &str) -> Result<(), EntryError> {
    if path.contains('\n') || path.contains('\r') {
        return Err(EntryError::InvalidPath {
            path: path.to_string(),
            reason: "contains a line break",
        });
    }
    // The marker must not reappear anywhere after the header's own prefix,
    // which also rules out paths ending in "---"
    let framed = format!("{}{}", path, MARKER_SUFFIX);
    if framed.contains(MARKER_PREFIX) {
        return Err(EntryError::InvalidPath {
            path: path.to_string(),
            reason: "contains the record marker '--- '",
        });
    }
    Ok(())
}

/// An ordered set of entries with unique normalized paths
#[derive(Debug, Clone, Default)]
pub struct Archive {
    entries: Vec<Entry>,
    /// Normalized paths already present
    paths: HashSet<String>,
}

impl Archive {
    /// Create a new empty archive
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry to the archive
    ///
    /// The path is normalized first. Fails on escaping, empty, duplicate or
    /// unframeable paths; the archive is left unchanged in that case.
    pub fn add_entry(&mut self, mut entry: Entry) -> Result<(), EntryError> {
        let path = normalize_path(&entry.path)?;
        check_framable(&path)?;

        if self.paths.contains(&path) {
            return Err(EntryError::DuplicatePath { path });
        }

        self.paths.insert(path.clone());
        entry.path = path;
        self.entries.push(entry);
        Ok(())
    }

    /// Read a file from disk and add it under `name`
    ///
    /// Returns the number of bytes read.
    pub fn add_file_from_path(&mut self, path: &Path, name: &str) -> Result<u64, EntryError> {
        let content = std::fs::read(path).map_err(|source| EntryError::ReadFailure {
            path: path.to_path_buf(),
            source,
        })?;
        let len = content.len() as u64;

        self.add_entry(Entry::new(name, content))?;
        Ok(len)
    }

    /// Entries in insertion order
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Iterate over entries in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    /// Check whether a normalized path is already present
    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the archive, returning its entries
    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a Archive {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_header() {
        let entry = Entry::new("a.txt", "Hi");
        assert_eq!(entry.header(), "--- a.txt ---");
    }

    #[test]
    fn test_normalize_plain_paths() {
        assert_eq!(normalize_path("a.txt").unwrap(), "a.txt");
        assert_eq!(normalize_path("dir/sub/file.rs").unwrap(), "dir/sub/file.rs");
        assert_eq!(normalize_path("./dir/./file").unwrap(), "dir/file");
        assert_eq!(normalize_path("dir//file/").unwrap(), "dir/file");
    }

    #[test]
    fn test_normalize_keeps_dotted_names() {
        assert_eq!(normalize_path(".gitignore").unwrap(), ".gitignore");
        assert_eq!(normalize_path("a/..b/c..").unwrap(), "a/..b/c..");
    }

    #[test]
    fn test_normalize_rejects_parent_segments() {
        for raw in ["..", "../x", "a/../../x", "a/..", "a\\..\\x"] {
            assert!(
                matches!(normalize_path(raw), Err(EntryError::PathEscape { .. })),
                "expected escape for {raw}"
            );
        }
    }

    #[test]
    fn test_normalize_rejects_absolute_paths() {
        for raw in ["/etc/passwd", "\\windows", "C:/boot.ini", "c:evil"] {
            assert!(
                matches!(normalize_path(raw), Err(EntryError::PathEscape { .. })),
                "expected escape for {raw}"
            );
        }
    }

    #[test]
    fn test_normalize_rejects_empty_and_nul() {
        assert!(matches!(normalize_path(""), Err(EntryError::InvalidPath { .. })));
        assert!(matches!(normalize_path("./."), Err(EntryError::InvalidPath { .. })));
        assert!(matches!(normalize_path("a\0b"), Err(EntryError::InvalidPath { .. })));
    }

    #[test]
    fn test_add_entry_normalizes_path() {
        let mut archive = Archive::new();
        archive.add_entry(Entry::new("./dir//x.bin", vec![1, 2])).unwrap();

        assert_eq!(archive.len(), 1);
        assert_eq!(archive.entries()[0].path, "dir/x.bin");
        assert!(archive.contains("dir/x.bin"));
    }

    #[test]
    fn test_add_entry_rejects_duplicates() {
        let mut archive = Archive::new();
        archive.add_entry(Entry::new("dir/x.bin", "one")).unwrap();

        let err = archive.add_entry(Entry::new("./dir/x.bin", "two")).unwrap_err();
        assert!(matches!(err, EntryError::DuplicatePath { ref path } if path == "dir/x.bin"));
        assert_eq!(archive.len(), 1);
        assert_eq!(archive.entries()[0].content, b"one");
    }

    #[test]
    fn test_add_entry_rejects_unframeable_paths() {
        let mut archive = Archive::new();
        assert!(matches!(
            archive.add_entry(Entry::new("weird--- name", "")),
            Err(EntryError::InvalidPath { .. })
        ));
        assert!(matches!(
            archive.add_entry(Entry::new("line\nbreak", "")),
            Err(EntryError::InvalidPath { .. })
        ));
        // "--- a--- ---" would split into "a" and "---"
        assert!(matches!(
            archive.add_entry(Entry::new("a---", "x")),
            Err(EntryError::InvalidPath { .. })
        ));
        assert!(matches!(
            archive.add_entry(Entry::new("dir/b---", "x")),
            Err(EntryError::InvalidPath { .. })
        ));
        assert!(archive.is_empty());

        // Dashes that cannot form the marker are fine
        archive.add_entry(Entry::new("a--", "x")).unwrap();
        archive.add_entry(Entry::new("-- b", "x")).unwrap();
        assert_eq!(archive.len(), 2);
    }

    #[test]
    fn test_add_entry_rejects_escape() {
        let mut archive = Archive::new();
        assert!(matches!(
            archive.add_entry(Entry::new("../outside", "x")),
            Err(EntryError::PathEscape { .. })
        ));
    }

    #[test]
    fn test_add_file_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("data.bin");
        std::fs::write(&file, [0u8, 255, 7]).unwrap();

        let mut archive = Archive::new();
        let read = archive.add_file_from_path(&file, "data.bin").unwrap();

        assert_eq!(read, 3);
        assert_eq!(archive.entries()[0].content, vec![0u8, 255, 7]);
    }

    #[test]
    fn test_add_file_from_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut archive = Archive::new();

        let err = archive
            .add_file_from_path(&dir.path().join("missing"), "missing")
            .unwrap_err();
        assert!(matches!(err, EntryError::ReadFailure { .. }));
        assert!(archive.is_empty());
    }
}
