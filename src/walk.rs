//! Directory collection
//!
//! Walks a directory tree and adds every regular file to an [`Archive`],
//! named by its path relative to the walk root. Unreadable files and
//! unvisitable directories are skipped and recorded, never fatal.

use std::path::Path;

use walkdir::WalkDir;

use crate::archive::Archive;
use crate::error::{EntryError, Error, Result};
use crate::report::ArchiveReport;

/// Options for [`add_dir`]
#[derive(Debug, Clone)]
pub struct WalkConfig {
    /// Follow symbolic links while walking
    pub follow_links: bool,
    /// Visit directory entries in file name order, making output reproducible
    pub sort_by_name: bool,
    /// Maximum depth below the root (`None` for unlimited)
    pub max_depth: Option<usize>,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            follow_links: false,
            sort_by_name: true,
            max_depth: None,
        }
    }
}

/// Collect a directory tree into a new archive
pub fn collect(root: &Path, config: &WalkConfig) -> Result<(Archive, ArchiveReport)> {
    let mut archive = Archive::new();
    let mut report = ArchiveReport::new();
    add_dir(&mut archive, root, config, &mut report)?;
    Ok((archive, report))
}

/// Add every regular file below `root` to `archive`
///
/// Fails only when `root` itself is missing or not a directory.
pub fn add_dir(
    archive: &mut Archive,
    root: &Path,
    config: &WalkConfig,
    report: &mut ArchiveReport,
) -> Result<()> {
    if !std::fs::metadata(root)?.is_dir() {
        return Err(Error::NotADirectory {
            path: root.to_path_buf(),
        });
    }

    let mut walker = WalkDir::new(root).follow_links(config.follow_links);
    if let Some(depth) = config.max_depth {
        walker = walker.max_depth(depth);
    }
    if config.sort_by_name {
        walker = walker.sort_by_file_name();
    }

    for item in walker {
        let entry = match item {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().unwrap_or(root).to_path_buf();
                report.skip(EntryError::ReadFailure {
                    path,
                    source: err.into(),
                });
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = match path.strip_prefix(root) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let name = match entry_name(relative) {
            Ok(name) => name,
            Err(err) => {
                report.skip(err);
                continue;
            }
        };

        match archive.add_file_from_path(path, &name) {
            Ok(len) => {
                log::info!("added {} ({} bytes)", name, len);
                report.entries_added += 1;
                report.bytes_read += len;
            }
            Err(err) => report.skip(err),
        }
    }

    Ok(())
}

/// Archive name for a relative path, components joined with `/`
///
/// Names that are not valid UTF-8 cannot be stored faithfully and are
/// refused.
pub fn entry_name(relative: &Path) -> std::result::Result<String, EntryError> {
    let mut parts = Vec::new();
    for component in relative.components() {
        match component.as_os_str().to_str() {
            Some(part) => parts.push(part),
            None => {
                return Err(EntryError::InvalidPath {
                    path: relative.to_string_lossy().into_owned(),
                    reason: "file name is not valid UTF-8",
                })
            }
        }
    }
    Ok(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_collect_nested_tree() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/bin")).unwrap();
        fs::write(dir.path().join("README.md"), "# hi").unwrap();
        fs::write(dir.path().join("src/lib.rs"), "").unwrap();
        fs::write(dir.path().join("src/bin/main.rs"), [0xFFu8, 0x00]).unwrap();

        let (archive, report) = collect(dir.path(), &WalkConfig::default()).unwrap();

        let paths: Vec<&str> = archive.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["README.md", "src/bin/main.rs", "src/lib.rs"]);
        assert_eq!(report.entries_added, 3);
        assert_eq!(report.bytes_read, 6);
        assert!(!report.has_skipped());
    }

    #[test]
    fn test_collect_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("only-dirs")).unwrap();

        let (archive, report) = collect(dir.path(), &WalkConfig::default()).unwrap();

        assert!(archive.is_empty());
        assert_eq!(report.entries_added, 0);
    }

    #[test]
    fn test_collect_max_depth() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(dir.path().join("top.txt"), "1").unwrap();
        fs::write(dir.path().join("a/b/deep.txt"), "2").unwrap();

        let config = WalkConfig {
            max_depth: Some(1),
            ..WalkConfig::default()
        };
        let (archive, _) = collect(dir.path(), &config).unwrap();

        assert_eq!(archive.len(), 1);
        assert_eq!(archive.entries()[0].path, "top.txt");
    }

    #[test]
    fn test_collect_missing_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();

        let err = collect(&dir.path().join("nope"), &WalkConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_collect_file_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();

        let err = collect(&file, &WalkConfig::default()).unwrap_err();
        assert!(matches!(err, Error::NotADirectory { .. }));
    }

    #[test]
    fn test_add_dir_skips_names_already_present() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "from disk").unwrap();

        let mut archive = Archive::new();
        archive
            .add_entry(crate::Entry::new("a.txt", "already here"))
            .unwrap();
        let mut report = ArchiveReport::new();

        add_dir(&mut archive, dir.path(), &WalkConfig::default(), &mut report).unwrap();

        assert_eq!(archive.len(), 1);
        assert_eq!(report.entries_added, 0);
        assert!(matches!(&report.skipped[..], [EntryError::DuplicatePath { .. }]));
    }

    #[test]
    fn test_entry_name_joins_components() {
        let relative = Path::new("src").join("bin").join("main.rs");
        assert_eq!(entry_name(&relative).unwrap(), "src/bin/main.rs");
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_name_is_skipped() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        let latin1 = dir.path().join(OsStr::from_bytes(b"caf\xe9.txt"));
        // Some filesystems refuse names that are not UTF-8
        if fs::write(&latin1, "x").is_err() {
            return;
        }
        fs::write(dir.path().join("plain.txt"), "y").unwrap();

        let (archive, report) = collect(dir.path(), &WalkConfig::default()).unwrap();

        assert_eq!(archive.len(), 1);
        assert_eq!(archive.entries()[0].path, "plain.txt");
        assert_eq!(report.entries_added, 1);
        assert!(matches!(
            &report.skipped[..],
            [EntryError::InvalidPath { reason: "file name is not valid UTF-8", .. }]
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_file_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let locked = dir.path().join("locked.bin");
        fs::write(&locked, "secret").unwrap();
        fs::write(dir.path().join("open.txt"), "fine").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not stop root
        if fs::read(&locked).is_ok() {
            return;
        }

        let (archive, report) = collect(dir.path(), &WalkConfig::default()).unwrap();

        assert_eq!(archive.len(), 1);
        assert_eq!(archive.entries()[0].path, "open.txt");
        assert!(matches!(&report.skipped[..], [EntryError::ReadFailure { .. }]));
    }
}
